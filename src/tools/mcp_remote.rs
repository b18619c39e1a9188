//! A tool that lives on a spawned MCP server.

use async_trait::async_trait;
use rmcp::service::{Peer, RoleClient};
use serde_json::Value as JsonValue;

use crate::core::content::ToolOutput;
use crate::core::tool::{Tool, ToolSpec};
use crate::domain::ToolError;
use crate::infra::runtime::mcp_transport::{call_remote_tool, RemoteToolInfo};

pub struct McpRemoteTool {
    server: String,
    info: RemoteToolInfo,
    peer: Peer<RoleClient>,
}

impl McpRemoteTool {
    pub fn new(server: impl Into<String>, info: RemoteToolInfo, peer: Peer<RoleClient>) -> Self {
        Self { server: server.into(), info, peer }
    }
}

impl ToolSpec for McpRemoteTool {
    fn name(&self) -> &str {
        &self.info.name
    }

    fn description(&self) -> &str {
        &self.info.description
    }

    fn input_schema(&self) -> JsonValue {
        self.info.input_schema.clone()
    }
}

#[async_trait]
impl Tool for McpRemoteTool {
    async fn call(&self, arguments: &JsonValue) -> Result<ToolOutput, ToolError> {
        let args = match arguments {
            JsonValue::Object(map) => Some(map.clone()),
            JsonValue::Null => None,
            other => {
                return Err(ToolError::InvalidArgs(format!("expected an object, got {other}")))
            }
        };
        tracing::debug!(server = %self.server, tool = %self.info.name, "calling remote tool");
        call_remote_tool(&self.peer, &self.info.name, args)
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))
    }
}
