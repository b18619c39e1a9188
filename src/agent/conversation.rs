//! Conversation turns in the model's wire shape (role + typed content blocks).

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::core::content::{ToolContent, ToolOutput};

/// Stands in for image results from earlier queries.
pub const IMAGE_OMITTED: &str = "[image omitted]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: JsonValue,
    },
    ToolResult {
        tool_use_id: String,
        content: Vec<ResultPart>,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
    /// Block kinds this client does not act on (e.g. `thinking`).
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultPart {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub media_type: String,
    pub data: String,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn tool_result(tool_use_id: impl Into<String>, output: &ToolOutput) -> Self {
        let mut content: Vec<ResultPart> = output
            .content
            .iter()
            .map(|c| match c {
                ToolContent::Text(text) => ResultPart::Text { text: text.clone() },
                ToolContent::Image { media_type, data } => ResultPart::Image {
                    source: ImageSource {
                        kind: "base64".into(),
                        media_type: media_type.clone(),
                        data: data.clone(),
                    },
                },
            })
            .collect();
        // The API rejects an empty tool_result content list paired with is_error.
        if content.is_empty() {
            content.push(ResultPart::Text { text: String::new() });
        }
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content,
            is_error: output.is_error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, content: vec![ContentBlock::text(text)] }
    }

    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self { role: Role::Assistant, content }
    }
}

/// Ordered turns of one chat session.
///
/// Consecutive user turns are merged: the API requires roles to alternate, and a
/// query can start right after a tool-result turn when the previous query hit a limit.
#[derive(Debug, Clone, Default)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push_user(&mut self, blocks: Vec<ContentBlock>) {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::User => last.content.extend(blocks),
            _ => self.messages.push(Message { role: Role::User, content: blocks }),
        }
    }

    pub fn push_assistant(&mut self, blocks: Vec<ContentBlock>) {
        self.messages.push(Message::assistant(blocks));
    }

    /// Replace every image tool result with [`IMAGE_OMITTED`] and return how many were dropped.
    ///
    /// Images are resent only within the query that read them.
    pub fn elide_images(&mut self) -> usize {
        let mut dropped = 0;
        for block in self.messages.iter_mut().flat_map(|m| m.content.iter_mut()) {
            if let ContentBlock::ToolResult { content, .. } = block {
                for part in content.iter_mut() {
                    if matches!(part, ResultPart::Image { .. }) {
                        *part = ResultPart::Text { text: IMAGE_OMITTED.into() };
                        dropped += 1;
                    }
                }
            }
        }
        dropped
    }

    /// Snapshot for rollback; merging may have changed the last turn in place.
    pub fn checkpoint(&self) -> History {
        self.clone()
    }
}
