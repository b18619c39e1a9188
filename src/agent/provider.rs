//! Model provider seam: one request/response round trip with tool definitions.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::agent::conversation::{ContentBlock, Message};

/// A tool as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: JsonValue,
}

#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    ContentFiltered,
    Other(String),
}

impl StopReason {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("end_turn") => StopReason::EndTurn,
            Some("tool_use") => StopReason::ToolUse,
            Some("max_tokens") => StopReason::MaxTokens,
            Some("stop_sequence") => StopReason::StopSequence,
            Some("refusal") | Some("content_filtered") => StopReason::ContentFiltered,
            Some(other) => StopReason::Other(other.to_owned()),
            None => StopReason::Other("none".into()),
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StopReason::EndTurn => "end_turn",
            StopReason::ToolUse => "tool_use",
            StopReason::MaxTokens => "max_tokens",
            StopReason::StopSequence => "stop_sequence",
            StopReason::ContentFiltered => "content_filtered",
            StopReason::Other(s) => s,
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: StopReason,
}

/// Longest `Retry-After` wait honored before retrying.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("missing credentials: set {0}")]
    MissingCredentials(String),
    #[error("authentication failed")]
    AuthenticationFailed,
    #[error("rate limited")]
    RateLimited { retry_after: Option<u64> },
    #[error("network error: {0}")]
    Network(String),
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. } | ProviderError::Network(_) => true,
            ProviderError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Server-suggested wait before the next attempt, capped at [`MAX_RETRY_AFTER`].
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited { retry_after: Some(secs) } => {
                Some(Duration::from_secs(*secs).min(MAX_RETRY_AFTER))
            }
            _ => None,
        }
    }
}

#[async_trait::async_trait]
pub trait ModelProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_stop_reasons() {
        assert_eq!(StopReason::parse(Some("tool_use")), StopReason::ToolUse);
        assert_eq!(StopReason::parse(Some("refusal")), StopReason::ContentFiltered);
        assert_eq!(StopReason::parse(Some("pause_turn")), StopReason::Other("pause_turn".into()));
        assert_eq!(StopReason::parse(Some("pause_turn")).to_string(), "pause_turn");
    }

    #[test]
    fn classifies_retryable_errors() {
        assert!(ProviderError::Network("reset".into()).is_retryable());
        assert!(ProviderError::RateLimited { retry_after: None }.is_retryable());
        assert!(ProviderError::Api { status: 529, message: "overloaded".into() }.is_retryable());
        assert!(!ProviderError::Api { status: 400, message: "bad".into() }.is_retryable());
        assert!(!ProviderError::AuthenticationFailed.is_retryable());
    }

    #[test]
    fn rate_limit_suggests_a_capped_delay() {
        let e = ProviderError::RateLimited { retry_after: Some(3) };
        assert_eq!(e.retry_after(), Some(Duration::from_secs(3)));
        let e = ProviderError::RateLimited { retry_after: Some(86_400) };
        assert_eq!(e.retry_after(), Some(MAX_RETRY_AFTER));
        assert_eq!(ProviderError::RateLimited { retry_after: None }.retry_after(), None);
        assert_eq!(ProviderError::Network("reset".into()).retry_after(), None);
    }
}
