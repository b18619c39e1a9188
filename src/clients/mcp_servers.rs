//! Spawns the MCP servers listed in the client config and exposes their tools.

use std::sync::Arc;

use crate::core::error::GatewayError;
use crate::core::tool::Tool;
use crate::infra::config::{ConfigError, McpServerEntry, McpServersConfig};
use crate::infra::runtime::mcp_transport::{
    list_remote_tools, spawn_stdio_client, ClientSession, RemoteToolInfo,
};
use crate::tools::mcp_remote::McpRemoteTool;
use crate::tools::registry::ToolRegistry;

pub struct ConnectedServers {
    sessions: Vec<(String, ClientSession)>,
}

fn command_for(entry: &McpServerEntry) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(&entry.command);
    cmd.args(&entry.args);
    if let Some(env) = &entry.env {
        cmd.envs(env);
    }
    cmd
}

/// Register one server's tools, rejecting names the registry already holds.
pub fn merge_server_tools<F>(
    registry: &mut ToolRegistry,
    server: &str,
    tools: Vec<RemoteToolInfo>,
    mut make_tool: F,
) -> Result<usize, GatewayError>
where
    F: FnMut(RemoteToolInfo) -> Arc<dyn Tool>,
{
    tracing::info!(
        server = %server,
        tools = ?tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        "server tools"
    );
    let mut added = 0;
    for info in tools {
        if registry.contains(&info.name) {
            return Err(ConfigError::Invalid(format!(
                "tool '{}' from server '{server}' is already registered",
                info.name
            ))
            .into());
        }
        registry
            .register(make_tool(info))
            .map_err(|e| GatewayError::Mcp(e.to_string()))?;
        added += 1;
    }
    Ok(added)
}

impl ConnectedServers {
    /// Spawn every configured server over stdio and complete the handshake.
    pub async fn connect(cfg: &McpServersConfig) -> Result<Self, GatewayError> {
        let mut sessions = Vec::with_capacity(cfg.servers.len());
        for (name, entry) in &cfg.servers {
            tracing::info!(server = %name, command = %entry.command, "connecting to MCP server");
            match spawn_stdio_client(command_for(entry)).await {
                Ok(session) => sessions.push((name.clone(), session)),
                Err(e) => {
                    let connected = Self { sessions };
                    connected.shutdown().await;
                    return Err(GatewayError::Mcp(format!(
                        "failed to start server '{name}' ({}): {e}",
                        entry.command
                    )));
                }
            }
        }
        Ok(Self { sessions })
    }

    pub fn server_names(&self) -> Vec<&str> {
        self.sessions.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Add every remote tool to `registry`; a name offered twice is a configuration error.
    pub async fn register_tools(&self, registry: &mut ToolRegistry) -> Result<usize, GatewayError> {
        let mut added = 0;
        for (name, session) in &self.sessions {
            let peer = session.peer().clone();
            let tools = list_remote_tools(&peer)
                .await
                .map_err(|e| GatewayError::Mcp(format!("server '{name}': listing tools failed: {e}")))?;
            added += merge_server_tools(registry, name, tools, |info| -> Arc<dyn Tool> {
                Arc::new(McpRemoteTool::new(name.clone(), info, peer.clone()))
            })?;
        }
        Ok(added)
    }

    pub async fn shutdown(self) {
        for (name, session) in self.sessions {
            if let Err(e) = session.cancel().await {
                tracing::warn!(server = %name, error = %e, "server did not shut down cleanly");
            }
        }
    }
}
