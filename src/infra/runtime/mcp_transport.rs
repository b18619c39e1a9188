//! Generic MCP transport helpers (stdio + streamable HTTP) decoupled from tool logic.

use std::sync::Arc;

use rmcp::handler::server::router::Router;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::model::{CallToolRequestParam, JsonObject};
use rmcp::service::{Peer, RoleClient, RunningService};
use rmcp::transport::streamable_http_server::tower::{StreamableHttpServerConfig, StreamableHttpService};
use rmcp::transport::TokioChildProcess;
use rmcp::{serve_server, ServiceExt};

pub use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
pub use rmcp::ServerHandler;

use crate::core::content::ToolOutput;

pub async fn serve_stdio<H>(
    factory: impl FnOnce() -> (H, ToolRouter<H>),
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    H: ServerHandler,
{
    let (handler, tools) = factory();
    let service = Router::new(handler).with_tools(tools);
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    let running = serve_server(service, (stdin, stdout)).await?;
    running.waiting().await?;
    Ok(())
}

pub fn make_streamable_http_service<H>(
    factory: impl Fn() -> (H, ToolRouter<H>) + Send + Sync + Clone + 'static,
    session_mgr: Arc<LocalSessionManager>,
) -> StreamableHttpService<Router<H>, LocalSessionManager>
where
    H: ServerHandler,
{
    let cfg = StreamableHttpServerConfig::default();
    let service_factory = move || {
        let (handler, tools) = factory();
        let service = Router::new(handler).with_tools(tools);
        Ok(service)
    };
    StreamableHttpService::new(service_factory, session_mgr, cfg)
}

pub type ClientSession = RunningService<RoleClient, ()>;

/// Spawn `command` and complete the MCP handshake over its stdin/stdout.
pub async fn spawn_stdio_client(
    command: tokio::process::Command,
) -> Result<ClientSession, Box<dyn std::error::Error + Send + Sync>> {
    let transport = TokioChildProcess::new(command)?;
    let session = ().serve(transport).await?;
    Ok(session)
}

/// Remote tool description as plain JSON fields.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

pub async fn list_remote_tools(
    peer: &Peer<RoleClient>,
) -> Result<Vec<RemoteToolInfo>, Box<dyn std::error::Error + Send + Sync>> {
    let tools = peer.list_all_tools().await?;
    tools
        .into_iter()
        .map(|tool| -> Result<RemoteToolInfo, Box<dyn std::error::Error + Send + Sync>> {
            let v = serde_json::to_value(&tool)?;
            Ok(RemoteToolInfo {
                name: v["name"].as_str().unwrap_or_default().to_owned(),
                description: v["description"].as_str().unwrap_or_default().to_owned(),
                input_schema: v
                    .get("inputSchema")
                    .cloned()
                    .unwrap_or_else(|| serde_json::json!({"type": "object"})),
            })
        })
        .collect()
}

pub async fn call_remote_tool(
    peer: &Peer<RoleClient>,
    name: &str,
    arguments: Option<JsonObject>,
) -> Result<ToolOutput, Box<dyn std::error::Error + Send + Sync>> {
    let result = peer
        .call_tool(CallToolRequestParam { name: name.to_owned().into(), arguments })
        .await?;
    Ok(ToolOutput::from_mcp_json(&serde_json::to_value(&result)?))
}
