use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::agent::conversation::{ContentBlock, Message};
use crate::agent::provider::{
    ModelProvider, ModelRequest, ModelResponse, ProviderError, StopReason, ToolDefinition,
};
use crate::infra::config::ModelConfig;
use crate::infra::http::headers::add_standard_headers;
use crate::infra::runtime::limits::{make_http_client_with, retry_async_hinted};

pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const API_VERSION: &str = "2023-06-01";

/// Messages API client.
#[derive(Clone)]
pub struct AnthropicRemote {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    retries: u32,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDefinition],
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

impl AnthropicRemote {
    pub fn new(cfg: &ModelConfig, api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let http = make_http_client_with(cfg).map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            model: cfg.model.clone(),
            retries: cfg.retries,
        })
    }

    /// Credentials come from the environment only.
    pub fn from_env(cfg: &ModelConfig) -> Result<Self, ProviderError> {
        let key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::MissingCredentials(API_KEY_ENV.into()))?;
        Self::new(cfg, key)
    }

    async fn send_once(&self, body: &MessagesRequest<'_>) -> Result<ModelResponse, ProviderError> {
        let req = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(body);
        let (req, rid) = add_standard_headers(req, None);
        tracing::debug!(request_id = %rid, model = %self.model, messages = body.messages.len(), "model request");

        let resp = req
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let message = resp.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => ProviderError::AuthenticationFailed,
                429 => ProviderError::RateLimited { retry_after },
                code => ProviderError::Api { status: code, message },
            });
        }

        let parsed: MessagesResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok(ModelResponse {
            content: parsed
                .content
                .into_iter()
                .filter(|b| *b != ContentBlock::Unsupported)
                .collect(),
            stop_reason: StopReason::parse(parsed.stop_reason.as_deref()),
        })
    }
}

#[async_trait::async_trait]
impl ModelProvider for AnthropicRemote {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ProviderError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: request.system.as_deref(),
            messages: &request.messages,
            tools: &request.tools,
        };
        let start = Instant::now();
        let result = retry_async_hinted(
            self.retries,
            500,
            ProviderError::is_retryable,
            ProviderError::retry_after,
            |attempt| {
                if attempt > 0 {
                    tracing::warn!(attempt, "retrying model request");
                }
                self.send_once(&body)
            },
        )
        .await;
        crate::infra::logging::log_metric("model", "model_requests_total", 1.0);
        crate::infra::logging::log_metric("model", "model_latency_ms", start.elapsed().as_millis() as f64);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn cfg(base: String) -> ModelConfig {
        ModelConfig { base_url: base, retries: 1, ..ModelConfig::default() }
    }

    fn request() -> ModelRequest {
        ModelRequest {
            system: Some("build things".into()),
            messages: vec![Message::user("make a tower")],
            tools: vec![ToolDefinition {
                name: "getHeight".into(),
                description: "height".into(),
                input_schema: json!({"type": "object", "properties": {}, "required": []}),
            }],
            max_tokens: 1000,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn sends_messages_request_and_parses_tool_use() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/messages")
                .header("x-api-key", "k")
                .header("anthropic-version", API_VERSION)
                .json_body_partial(r#"{"max_tokens":1000,"system":"build things"}"#);
            then.status(200).json_body(json!({
                "id": "msg_1", "model": "m", "type": "message", "role": "assistant",
                "content": [
                    {"type": "thinking", "thinking": "..."},
                    {"type": "text", "text": "checking"},
                    {"type": "tool_use", "id": "tu_1", "name": "getHeight", "input": {"x": 0, "z": 0}}
                ],
                "stop_reason": "tool_use",
                "usage": {"input_tokens": 1, "output_tokens": 1}
            }));
        });

        let provider = AnthropicRemote::new(&cfg(server.base_url()), "k").unwrap();
        let resp = provider.complete(&request()).await.unwrap();
        m.assert();
        assert_eq!(resp.stop_reason, StopReason::ToolUse);
        assert_eq!(resp.content.len(), 2);
        assert!(matches!(&resp.content[1], ContentBlock::ToolUse { name, .. } if name == "getHeight"));
    }

    #[tokio::test]
    async fn maps_auth_failure_without_retry() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(401).body("{\"error\":\"bad key\"}");
        });
        let provider = AnthropicRemote::new(&cfg(server.base_url()), "bad").unwrap();
        let err = provider.complete(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed));
        m.assert_hits(1);
    }

    #[tokio::test]
    async fn retries_server_errors() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(503).body("overloaded");
        });
        let provider = AnthropicRemote::new(&cfg(server.base_url()), "k").unwrap();
        let err = provider.complete(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Api { status: 503, .. }));
        m.assert_hits(2);
    }

    #[tokio::test]
    async fn rate_limit_honors_retry_after() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST).path("/v1/messages");
            then.status(429).header("retry-after", "0").body("slow down");
        });
        let provider = AnthropicRemote::new(&cfg(server.base_url()), "k").unwrap();
        let started = Instant::now();
        let err = provider.complete(&request()).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { retry_after: Some(0) }));
        m.assert_hits(2);
        assert!(started.elapsed() < std::time::Duration::from_millis(400));
    }

    #[test]
    #[serial_test::serial]
    fn from_env_requires_api_key() {
        std::env::remove_var(API_KEY_ENV);
        let err = AnthropicRemote::from_env(&ModelConfig::default()).err().unwrap();
        assert!(matches!(err, ProviderError::MissingCredentials(_)));
        assert_eq!(err.to_string(), "missing credentials: set ANTHROPIC_API_KEY");
    }
}
