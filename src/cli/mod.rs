use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::agent::agent_loop::{chat_loop, Agent, AgentSettings};
use crate::clients::anthropic::AnthropicRemote;
use crate::clients::mcp_servers::ConnectedServers;
use crate::clients::mcpi::McpiRemote;
use crate::core::error::GatewayError;
use crate::domain::World;
use crate::infra::config::{AppConfig, Config, McpServersConfig};
use crate::tools::image_reader::ImageReader;
use crate::tools::registry::ToolRegistry;

#[derive(Parser)]
#[command(name = "minecraft-mcp-gateway")]
#[command(about = "Drive a Minecraft world from a language-model agent over MCP")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP tool server (MODE=stdio by default, MODE=server for HTTP)
    Serve,
    /// Start the interactive agent
    Chat {
        /// JSON file listing the MCP servers to spawn
        config: PathBuf,
        /// Run a single query and exit
        #[arg(short, long)]
        query: Option<String>,
    },
    /// List the tools the configured MCP servers provide
    Tools {
        /// JSON file listing the MCP servers to spawn
        config: PathBuf,
    },
    /// Health check an HTTP-mode server
    Health {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Validate configuration
    Config {
        /// Validate config without starting service
        #[arg(long)]
        validate: bool,
    },
    /// Check that the game server answers
    PingWorld,
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    run_commands(cli.command).await
}

pub async fn run_commands(command: Commands) -> ExitCode {
    let app = match AppConfig::from_env_and_toml() {
        Ok(app) => app,
        Err(e) => {
            crate::infra::logging::init(None);
            eprintln!("❌ Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    crate::infra::logging::init(app.logging.dir.as_deref());

    match command {
        Commands::Serve => match crate::infra::boot::run_server(&app).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "server stopped");
                eprintln!("❌ Server failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Chat { config, query } => match chat(&config, query, &app).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Tools { config } => match list_tools(&config).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Health { url } => match health_check(&url).await {
            Ok(_) => {
                println!("✅ Service is healthy");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Health check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Config { validate: _ } => match validate_config(&app) {
            Ok(_) => {
                println!("✅ Configuration is valid");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::PingWorld => match ping_world(&app).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ Game server check failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

/// Remote tools from every configured server plus the local image reader.
async fn build_registry(servers: &ConnectedServers) -> Result<ToolRegistry, GatewayError> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(ImageReader))?;
    servers.register_tools(&mut registry).await?;
    Ok(registry)
}

async fn chat(config: &Path, query: Option<String>, app: &AppConfig) -> Result<(), GatewayError> {
    let servers_cfg = McpServersConfig::load(config)?;
    let provider = AnthropicRemote::from_env(&app.model)?;
    let servers = ConnectedServers::connect(&servers_cfg).await?;

    let result = async {
        let registry = build_registry(&servers).await?;
        let names: Vec<String> = registry.list().into_iter().map(|t| t.name).collect();
        println!("\nConnected to {:?} with tools: {:?}", servers.server_names(), names);

        let mut agent = Agent::new(Arc::new(provider), registry, AgentSettings::from_config(&app.model));
        match query {
            Some(q) => {
                let transcript = agent.process_query(&q).await?;
                println!("\n{}", transcript);
            }
            None => {
                let stdin = tokio::io::BufReader::new(tokio::io::stdin());
                chat_loop(&mut agent, stdin, tokio::io::stdout()).await?;
            }
        }
        Ok::<(), GatewayError>(())
    }
    .await;

    servers.shutdown().await;
    result
}

async fn list_tools(config: &Path) -> Result<(), GatewayError> {
    let servers_cfg = McpServersConfig::load(config)?;
    let servers = ConnectedServers::connect(&servers_cfg).await?;
    let result = build_registry(&servers).await;
    servers.shutdown().await;

    let registry = result?;
    println!("🔧 {} tools:", registry.len());
    for tool in registry.list() {
        let first_line = tool.description.lines().next().unwrap_or_default();
        println!("  {} - {}", tool.name, first_line);
    }
    Ok(())
}

async fn health_check(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = crate::infra::runtime::limits::make_http_client()?;
    let (request, _) = crate::infra::http::headers::add_standard_headers(
        client.get(format!("{}/healthz", url.trim_end_matches('/'))),
        None,
    );
    let response = request
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("HTTP {}", response.status()).into())
    }
}

fn validate_config(app: &AppConfig) -> Result<(), GatewayError> {
    Config::from_env().validate()?;
    app.validate()?;

    println!("📋 Configuration:");
    println!("  Game server: {}:{}", app.world.host, app.world.port);
    println!("  Model: {} ({})", app.model.model, app.model.base_url);
    println!("  Captures: {}", app.capture.output_dir.display());
    match &app.logging.dir {
        Some(dir) => println!("  Log dir: {}", dir.display()),
        None => println!("  Log dir: stderr only"),
    }
    let key_set = std::env::var(crate::clients::anthropic::API_KEY_ENV).is_ok_and(|k| !k.trim().is_empty());
    println!(
        "  {}: {}",
        crate::clients::anthropic::API_KEY_ENV,
        if key_set { "set" } else { "not set (required for chat)" }
    );
    Ok(())
}

async fn ping_world(app: &AppConfig) -> Result<(), GatewayError> {
    let world = McpiRemote::from_config(&app.world);
    let pos = world.player_tile().await?;
    println!("✅ Game server at {} is reachable; player at {}", world.addr(), pos);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[tokio::test]
    async fn health_check_fails_without_service() {
        let result = health_check("http://localhost:9").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn health_check_ok_and_error_paths() {
        use httpmock::prelude::*;
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/healthz");
            then.status(200).body("ok");
        });
        assert!(health_check(&server.base_url()).await.is_ok());

        let bad = MockServer::start();
        bad.mock(|when, then| {
            when.method(GET).path("/healthz");
            then.status(500);
        });
        assert!(health_check(&bad.base_url()).await.is_err());
    }

    #[test]
    #[serial]
    fn validate_config_accepts_defaults() {
        env::remove_var("MODE");
        env::remove_var("PORT");
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    #[serial]
    fn validate_config_rejects_invalid_mode_and_port() {
        env::set_var("MODE", "invalid");
        let err = validate_config(&AppConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Invalid MODE"));

        env::set_var("MODE", "server");
        env::set_var("PORT", "0");
        let err = validate_config(&AppConfig::default()).unwrap_err();
        assert!(err.to_string().contains("PORT cannot be 0"));

        env::remove_var("MODE");
        env::remove_var("PORT");
    }

    #[test]
    #[serial]
    fn validate_config_rejects_bad_app_settings() {
        env::remove_var("MODE");
        let mut app = AppConfig::default();
        app.model.max_turns = 0;
        let err = validate_config(&app).unwrap_err();
        assert!(err.to_string().contains("max_turns"));
    }

    #[tokio::test]
    #[serial]
    async fn run_commands_config_success_and_failure() {
        env::remove_var("CONFIG_PATH");
        env::remove_var("MODE");
        let code = run_commands(Commands::Config { validate: true }).await;
        assert_eq!(code, ExitCode::SUCCESS);

        env::set_var("MODE", "nope");
        let code = run_commands(Commands::Config { validate: true }).await;
        assert_eq!(code, ExitCode::FAILURE);
        env::remove_var("MODE");
    }

    #[tokio::test]
    #[serial]
    async fn run_commands_reports_missing_config_file() {
        env::set_var("CONFIG_PATH", "/no/such/minecraft-mcp.toml");
        let code = run_commands(Commands::Config { validate: true }).await;
        assert_eq!(code, ExitCode::FAILURE);
        env::remove_var("CONFIG_PATH");
    }

    #[tokio::test]
    #[serial]
    async fn chat_fails_fast_on_bad_registry_file() {
        env::remove_var("CONFIG_PATH");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.json");
        std::fs::write(&path, r#"{"servers": {}}"#).unwrap();
        let code = run_commands(Commands::Chat { config: path, query: None }).await;
        assert_eq!(code, ExitCode::FAILURE);

        let code = run_commands(Commands::Tools { config: dir.path().join("missing.json") }).await;
        assert_eq!(code, ExitCode::FAILURE);
    }

    #[tokio::test]
    #[serial]
    async fn chat_requires_api_key() {
        env::remove_var("CONFIG_PATH");
        env::remove_var(crate::clients::anthropic::API_KEY_ENV);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.json");
        std::fs::write(&path, r#"{"mcpServers": {"mc": {"command": "true"}}}"#).unwrap();
        let err = chat(&path, Some("hi".into()), &AppConfig::default()).await.unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[tokio::test]
    async fn ping_world_reports_unreachable_server() {
        let mut app = AppConfig::default();
        app.world.port = 9;
        app.world.retries = 0;
        let err = ping_world(&app).await.unwrap_err();
        assert!(err.to_string().starts_with("world error:"));
    }

    #[test]
    fn parses_chat_arguments() {
        let cli = Cli::try_parse_from(["minecraft-mcp-gateway", "chat", "mcp.json", "--query", "build a house"]).unwrap();
        match cli.command {
            Commands::Chat { config, query } => {
                assert_eq!(config, PathBuf::from("mcp.json"));
                assert_eq!(query.as_deref(), Some("build a house"));
            }
            _ => panic!("expected chat"),
        }
        assert!(Cli::try_parse_from(["minecraft-mcp-gateway", "ping-world"]).is_ok());
    }
}
