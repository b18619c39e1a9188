//! The read / ask model / run tools / answer cycle.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::agent::conversation::{ContentBlock, History};
use crate::agent::provider::{ModelProvider, ModelRequest, StopReason, ToolDefinition};
use crate::core::content::ToolOutput;
use crate::core::error::GatewayError;
use crate::infra::config::ModelConfig;
use crate::tools::registry::ToolRegistry;

pub const EMPTY_QUERY_REPLY: &str = "Query is empty. Please enter a question or instruction.";
pub const NO_TOOLS_REPLY: &str = "Warning: no tools are available. Check the server configuration.";

#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub system_prompt: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_turns: usize,
}

impl AgentSettings {
    pub fn from_config(cfg: &ModelConfig) -> Self {
        Self {
            system_prompt: Some(cfg.system_prompt.clone()).filter(|s| !s.trim().is_empty()),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
            max_turns: cfg.max_turns,
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::from_config(&ModelConfig::default())
    }
}

pub struct Agent {
    provider: Arc<dyn ModelProvider>,
    tools: ToolRegistry,
    settings: AgentSettings,
    history: History,
}

impl Agent {
    pub fn new(provider: Arc<dyn ModelProvider>, tools: ToolRegistry, settings: AgentSettings) -> Self {
        Self { provider, tools, settings, history: History::default() }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Run one user query to completion and return the transcript.
    ///
    /// On error the conversation is restored to its state before the query.
    pub async fn process_query(&mut self, query: &str) -> Result<String, GatewayError> {
        let query = query.trim();
        if query.is_empty() {
            tracing::warn!("empty query");
            return Ok(EMPTY_QUERY_REPLY.into());
        }
        if self.tools.is_empty() {
            return Ok(NO_TOOLS_REPLY.into());
        }
        tracing::info!(query, "processing query");
        let checkpoint = self.history.checkpoint();
        match self.run(query).await {
            Ok(transcript) => Ok(transcript),
            Err(e) => {
                tracing::error!(error = %e, "query failed; conversation rolled back");
                self.history = checkpoint;
                Err(e)
            }
        }
    }

    fn request(&self, tools: &[ToolDefinition]) -> ModelRequest {
        ModelRequest {
            system: self.settings.system_prompt.clone(),
            messages: self.history.messages().to_vec(),
            tools: tools.to_vec(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        }
    }

    async fn run(&mut self, query: &str) -> Result<String, GatewayError> {
        let dropped = self.history.elide_images();
        if dropped > 0 {
            tracing::debug!(dropped, "images from earlier queries omitted");
        }
        self.history.push_user(vec![ContentBlock::text(query)]);
        let tools = self.tools.list();
        let mut transcript: Vec<String> = Vec::new();
        let mut turns = 0usize;

        loop {
            let response = self.provider.complete(&self.request(&tools)).await?;
            turns += 1;
            tracing::info!(stop_reason = %response.stop_reason, turn = turns, "model response");

            if response.stop_reason != StopReason::ToolUse {
                // Unanswered tool_use blocks would poison the next request.
                let kept: Vec<ContentBlock> = response
                    .content
                    .iter()
                    .filter(|b| matches!(b, ContentBlock::Text { text } if !text.trim().is_empty()))
                    .cloned()
                    .collect();
                if !kept.is_empty() {
                    self.history.push_assistant(kept);
                }
            }

            match response.stop_reason {
                StopReason::ToolUse => {
                    transcript.push("received toolUse request".into());
                    // The API rejects empty text blocks when the turn is sent back.
                    let content: Vec<ContentBlock> = response
                        .content
                        .into_iter()
                        .filter(|b| !matches!(b, ContentBlock::Text { text } if text.trim().is_empty()))
                        .collect();
                    if !content.is_empty() {
                        self.history.push_assistant(content.clone());
                    }
                    let mut results = Vec::new();
                    for block in &content {
                        match block {
                            ContentBlock::Text { text } => transcript.push(format!("[Thinking: {text}]")),
                            ContentBlock::ToolUse { id, name, input } => {
                                let (line, output) = self.execute(name, input).await;
                                transcript.push(line);
                                results.push(ContentBlock::tool_result(id.clone(), &output));
                            }
                            _ => {}
                        }
                    }
                    if results.is_empty() {
                        transcript.push("[Error: Invalid tool use request format]".into());
                        break;
                    }
                    self.history.push_user(results);
                    if turns >= self.settings.max_turns {
                        tracing::warn!(turns, "max turns reached");
                        transcript.push("[Max turns reached, ending conversation.]".into());
                        break;
                    }
                }
                StopReason::EndTurn => {
                    let text: Vec<&str> = response
                        .content
                        .iter()
                        .filter_map(|b| match b {
                            ContentBlock::Text { text } if !text.trim().is_empty() => Some(text.as_str()),
                            _ => None,
                        })
                        .collect();
                    if text.is_empty() {
                        transcript.push("[Response contains no text]".into());
                    } else {
                        transcript.push(text.join("\n"));
                    }
                    break;
                }
                StopReason::MaxTokens => {
                    transcript.push("[Max tokens reached, ending conversation.]".into());
                    break;
                }
                StopReason::StopSequence => {
                    transcript.push("[Stop sequence reached, ending conversation.]".into());
                    break;
                }
                StopReason::ContentFiltered => {
                    transcript.push("[Content filtered, ending conversation.]".into());
                    break;
                }
                StopReason::Other(reason) => {
                    transcript.push(format!("[Unknown stop reason: {reason}]"));
                    break;
                }
            }
        }

        Ok(transcript.join("\n\n"))
    }

    /// Run one tool call; failures become error results for the model, never loop errors.
    async fn execute(&self, name: &str, input: &JsonValue) -> (String, ToolOutput) {
        tracing::info!(tool = name, args = %input, "tool call");
        match self.tools.call(name, input).await {
            Ok(output) if output.content.is_empty() => {
                tracing::warn!(tool = name, "empty tool response");
                (
                    format!("[Tool {name} returned empty response]"),
                    ToolOutput::error(format!("tool {name} returned an empty response")),
                )
            }
            Ok(output) => {
                tracing::debug!(tool = name, result = %output.text_summary(), is_error = output.is_error, "tool result");
                (format!("[Calling tool {name} with args {input}]"), output)
            }
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool call failed");
                (format!("[Error calling tool {name}: {e}]"), ToolOutput::error(e.to_string()))
            }
        }
    }
}

/// Interactive loop: one query per line until `quit` or end of input.
pub async fn chat_loop<R, W>(agent: &mut Agent, input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output
        .write_all(b"\nMCP Client Started!\nType your queries or 'quit' to exit.\n")
        .await?;
    let mut lines = input.lines();
    loop {
        output.write_all(b"\nQuery: ").await?;
        output.flush().await?;
        let Some(line) = lines.next_line().await? else {
            tracing::info!("end of input");
            break;
        };
        let query = line.trim();
        if query.eq_ignore_ascii_case("quit") {
            tracing::info!("quit requested");
            break;
        }
        let reply = match agent.process_query(query).await {
            Ok(transcript) => format!("\n{transcript}\n"),
            Err(e) => format!("\nError: {e}\n"),
        };
        output.write_all(reply.as_bytes()).await?;
    }
    output.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::provider::{ModelResponse, ProviderError};
    use crate::core::tool::{Tool, ToolSpec};
    use crate::domain::ToolError;
    use crate::agent::conversation::Role;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records every request.
    #[derive(Default)]
    struct Scripted {
        responses: Mutex<VecDeque<Result<ModelResponse, ProviderError>>>,
        requests: Mutex<Vec<ModelRequest>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<ModelResponse, ProviderError>>) -> Arc<Self> {
            Arc::new(Self { responses: Mutex::new(responses.into()), requests: Mutex::default() })
        }
        fn requests(&self) -> Vec<ModelRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ModelProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }
        async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ProviderError> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(end_turn("done")))
        }
    }

    struct Height;

    impl ToolSpec for Height {
        fn name(&self) -> &str {
            "getHeight"
        }
        fn description(&self) -> &str {
            "height"
        }
        fn input_schema(&self) -> JsonValue {
            json!({"type": "object", "properties": {"x": {"type": "integer"}}, "required": ["x"]})
        }
    }

    #[async_trait::async_trait]
    impl Tool for Height {
        async fn call(&self, args: &JsonValue) -> Result<ToolOutput, ToolError> {
            match args.get("x").and_then(|v| v.as_i64()) {
                Some(_) => Ok(ToolOutput::text("64")),
                None => Err(ToolError::InvalidArgs("missing required field: x".into())),
            }
        }
    }

    fn end_turn(text: &str) -> ModelResponse {
        ModelResponse { content: vec![ContentBlock::text(text)], stop_reason: StopReason::EndTurn }
    }

    fn tool_use(calls: &[(&str, &str, JsonValue)]) -> ModelResponse {
        let mut content = vec![ContentBlock::text("let me check")];
        content.extend(calls.iter().map(|(id, name, input)| ContentBlock::ToolUse {
            id: id.to_string(),
            name: name.to_string(),
            input: input.clone(),
        }));
        ModelResponse { content, stop_reason: StopReason::ToolUse }
    }

    fn agent(provider: Arc<Scripted>, settings: AgentSettings) -> Agent {
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(Height)).unwrap();
        Agent::new(provider, tools, settings)
    }

    #[tokio::test]
    async fn runs_tools_until_end_turn() {
        let provider = Scripted::new(vec![
            Ok(tool_use(&[("t1", "getHeight", json!({"x": 1})), ("t2", "getHeight", json!({}))])),
            Ok(end_turn("The ground is at y=64.")),
        ]);
        let mut agent = agent(provider.clone(), AgentSettings::default());
        let out = agent.process_query("how high?").await.unwrap();
        assert_eq!(
            out,
            [
                "received toolUse request",
                "[Thinking: let me check]",
                r#"[Calling tool getHeight with args {"x":1}]"#,
                "[Error calling tool getHeight: invalid arguments: missing required field: x]",
                "The ground is at y=64.",
            ]
            .join("\n\n")
        );

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].max_tokens, 1000);
        assert_eq!(requests[0].temperature, 0.0);
        // Both results go back in a single user turn.
        let last = requests[1].messages.last().unwrap();
        assert_eq!(last.role, Role::User);
        assert_eq!(last.content.len(), 2);
        assert!(matches!(&last.content[1], ContentBlock::ToolResult { is_error: true, .. }));
        assert_eq!(agent.history().len(), 4);
    }

    #[tokio::test]
    async fn empty_text_blocks_are_not_recorded_or_resent() {
        let provider = Scripted::new(vec![
            Ok(ModelResponse {
                content: vec![
                    ContentBlock::text(""),
                    ContentBlock::ToolUse { id: "t1".into(), name: "getHeight".into(), input: json!({"x": 0}) },
                ],
                stop_reason: StopReason::ToolUse,
            }),
            Ok(ModelResponse {
                content: vec![ContentBlock::text("  "), ContentBlock::text("y=64")],
                stop_reason: StopReason::EndTurn,
            }),
        ]);
        let mut agent = agent(provider.clone(), AgentSettings::default());
        let out = agent.process_query("how high?").await.unwrap();
        assert!(!out.contains("[Thinking"));

        let resent = &provider.requests()[1].messages[1];
        assert_eq!(resent.role, Role::Assistant);
        assert_eq!(resent.content.len(), 1);
        assert!(matches!(&resent.content[0], ContentBlock::ToolUse { .. }));
        let last = agent.history().messages().last().unwrap();
        assert_eq!(last.content, vec![ContentBlock::text("y=64")]);
    }

    #[tokio::test]
    async fn unknown_tools_are_rejected_not_executed() {
        let provider = Scripted::new(vec![
            Ok(tool_use(&[("t1", "dig", json!({"depth": 3}))])),
            Ok(end_turn("ok")),
        ]);
        let mut agent = agent(provider.clone(), AgentSettings::default());
        let out = agent.process_query("dig").await.unwrap();
        assert!(out.contains("[Error calling tool dig: unknown tool: dig]"));
        let second = &provider.requests()[1];
        match &second.messages.last().unwrap().content[0] {
            ContentBlock::ToolResult { tool_use_id, is_error, content } => {
                assert_eq!(tool_use_id, "t1");
                assert!(*is_error);
                assert_eq!(
                    content[0],
                    crate::agent::conversation::ResultPart::Text { text: "unknown tool: dig".into() }
                );
            }
            other => panic!("expected tool result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn maps_stop_reasons_to_transcript_lines() {
        let cases = [
            (StopReason::MaxTokens, "[Max tokens reached, ending conversation.]"),
            (StopReason::StopSequence, "[Stop sequence reached, ending conversation.]"),
            (StopReason::ContentFiltered, "[Content filtered, ending conversation.]"),
            (StopReason::Other("pause_turn".into()), "[Unknown stop reason: pause_turn]"),
        ];
        for (reason, line) in cases {
            let provider = Scripted::new(vec![Ok(ModelResponse { content: vec![], stop_reason: reason })]);
            let mut agent = agent(provider, AgentSettings::default());
            assert_eq!(agent.process_query("hi").await.unwrap(), line);
        }

        let provider = Scripted::new(vec![Ok(ModelResponse { content: vec![], stop_reason: StopReason::EndTurn })]);
        let mut agent = agent(provider, AgentSettings::default());
        assert_eq!(agent.process_query("hi").await.unwrap(), "[Response contains no text]");
    }

    #[tokio::test]
    async fn stops_after_max_turns() {
        let looping: Vec<_> = (0..5)
            .map(|i| {
                let id = format!("t{i}");
                Ok(tool_use(&[(id.as_str(), "getHeight", json!({"x": i}))]))
            })
            .collect();
        let provider = Scripted::new(looping);
        let settings = AgentSettings { max_turns: 2, ..AgentSettings::default() };
        let mut agent = agent(provider.clone(), settings);
        let out = agent.process_query("loop").await.unwrap();
        assert!(out.ends_with("[Max turns reached, ending conversation.]"));
        assert_eq!(provider.requests().len(), 2);

        // The next query merges into the trailing tool-result turn.
        agent.process_query("again").await.unwrap();
        let next = provider.requests().pop().unwrap();
        let roles: Vec<Role> = next.messages.iter().map(|m| m.role).collect();
        assert!(roles.windows(2).all(|w| w[0] != w[1]));
    }

    #[tokio::test]
    async fn failed_query_rolls_back_history() {
        let provider = Scripted::new(vec![
            Ok(end_turn("first")),
            Err(ProviderError::Network("reset".into())),
        ]);
        let mut agent = agent(provider, AgentSettings::default());
        agent.process_query("one").await.unwrap();
        assert_eq!(agent.history().len(), 2);
        let err = agent.process_query("two").await.unwrap_err();
        assert_eq!(err.to_string(), "model error: network error: reset");
        assert_eq!(agent.history().len(), 2);
    }

    #[tokio::test]
    async fn empty_query_is_not_sent() {
        let provider = Scripted::new(vec![]);
        let mut agent = agent(provider.clone(), AgentSettings::default());
        assert_eq!(agent.process_query("   ").await.unwrap(), EMPTY_QUERY_REPLY);
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn chat_loop_quits_without_contacting_the_model() {
        let provider = Scripted::new(vec![]);
        let mut agent = agent(provider.clone(), AgentSettings::default());
        let mut out = Vec::new();
        chat_loop(&mut agent, &b"  QUIT \nnever sent\n"[..], &mut out).await.unwrap();
        assert!(provider.requests().is_empty());
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Type your queries or 'quit' to exit."));
    }

    #[tokio::test]
    async fn chat_loop_prints_answers_and_errors() {
        let provider = Scripted::new(vec![
            Ok(end_turn("hello there")),
            Err(ProviderError::AuthenticationFailed),
        ]);
        let mut agent = agent(provider, AgentSettings::default());
        let mut out = Vec::new();
        chat_loop(&mut agent, &b"hi\nagain\n"[..], &mut out).await.unwrap();
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("\nhello there\n"));
        assert!(printed.contains("Error: model error: authentication failed"));
    }
}
