use std::net::SocketAddr;
use std::sync::Arc;

use crate::clients::capture::ScreenCapture;
use crate::clients::mcpi::McpiRemote;
use crate::domain::World;
use crate::infra::config::{AppConfig, Config};
use crate::tools::minecraft::tool_router::{MinecraftRouter, MinecraftSvc};

/// Handler factory shared by the stdio and HTTP transports.
pub fn minecraft_factory(
    app: &AppConfig,
) -> impl Fn() -> (MinecraftSvc, MinecraftRouter) + Send + Sync + Clone + 'static {
    let world: Arc<dyn World> = Arc::new(McpiRemote::from_config(&app.world));
    let screen = ScreenCapture::new(&app.capture);
    move || (MinecraftSvc::new(world.clone(), screen.clone()), MinecraftSvc::router())
}

pub async fn run_server(app: &AppConfig) -> anyhow::Result<()> {
    let cfg = Config::from_env();
    cfg.validate()?;
    tracing::info!(
        mode = %cfg.mode,
        port = cfg.port,
        world = %format!("{}:{}", app.world.host, app.world.port),
        "BOOT minecraft-mcp-gateway"
    );

    let factory = minecraft_factory(app);
    if cfg.mode == "stdio" {
        crate::infra::runtime::mcp_transport::serve_stdio(factory)
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        return Ok(());
    }

    let app = crate::infra::http_app::build_app(factory);
    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    tracing::info!(%addr, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn stdio_is_the_default_mode() {
        std::env::remove_var("MODE");
        let cfg = Config::from_env();
        assert_eq!(cfg.mode, "stdio");
    }

    #[test]
    fn factory_builds_fresh_handlers() {
        let factory = minecraft_factory(&AppConfig::default());
        let (_svc, router) = factory();
        assert_eq!(router.list_all().len(), 9);
        let (_svc2, _router2) = factory();
    }
}
