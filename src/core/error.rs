use thiserror::Error;

use crate::agent::provider::ProviderError;
use crate::domain::{ToolError, WorldError};
use crate::infra::config::ConfigError;

/// Gateway-wide error model surfaced to the CLI and the chat loop.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("model error: {0}")]
    Model(#[from] ProviderError),
    #[error("world error: {0}")]
    World(#[from] WorldError),
    #[error("tool error: {0}")]
    Tool(#[from] ToolError),
    #[error("mcp error: {0}")]
    Mcp(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
