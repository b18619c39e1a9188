//! Tool output content model shared by local and remote tools.

use serde_json::Value as JsonValue;

/// One piece of tool output.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolContent {
    Text(String),
    /// Base64 encoded image bytes.
    Image { media_type: String, data: String },
}

/// Result of a single tool invocation as handed back to the model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolOutput {
    pub content: Vec<ToolContent>,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self { content: vec![ToolContent::Text(text.into())], is_error: false }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { content: vec![ToolContent::Text(text.into())], is_error: true }
    }

    /// Concatenated text parts, used for transcripts and logs.
    pub fn text_summary(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                ToolContent::Text(t) => t.clone(),
                ToolContent::Image { media_type, data } => {
                    format!("<{media_type} image, {} base64 bytes>", data.len())
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Build from an MCP `CallToolResult` serialized as JSON.
    ///
    /// Text and image parts are kept; when only `structuredContent` is present
    /// it is rendered as JSON text.
    pub fn from_mcp_json(v: &JsonValue) -> Self {
        let mut content = Vec::new();
        for part in v.get("content").and_then(|c| c.as_array()).into_iter().flatten() {
            match part.get("type").and_then(|t| t.as_str()) {
                Some("text") => {
                    if let Some(t) = part.get("text").and_then(|t| t.as_str()) {
                        content.push(ToolContent::Text(t.to_owned()));
                    }
                }
                Some("image") => {
                    let data = part.get("data").and_then(|d| d.as_str());
                    let mime = part.get("mimeType").and_then(|d| d.as_str());
                    if let (Some(data), Some(mime)) = (data, mime) {
                        content.push(ToolContent::Image {
                            media_type: mime.to_owned(),
                            data: data.to_owned(),
                        });
                    }
                }
                _ => {}
            }
        }
        if content.is_empty() {
            if let Some(structured) = v.get("structuredContent").filter(|s| !s.is_null()) {
                content.push(ToolContent::Text(structured.to_string()));
            }
        }
        let is_error = v.get("isError").and_then(|e| e.as_bool()).unwrap_or(false);
        Self { content, is_error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_text_and_error_flag() {
        let out = ToolOutput::from_mcp_json(&json!({
            "content": [{"type": "text", "text": "64"}],
            "isError": false
        }));
        assert_eq!(out, ToolOutput::text("64"));

        let out = ToolOutput::from_mcp_json(&json!({
            "content": [{"type": "text", "text": "refused"}],
            "isError": true
        }));
        assert!(out.is_error);
    }

    #[test]
    fn falls_back_to_structured_content() {
        let out = ToolOutput::from_mcp_json(&json!({
            "content": [],
            "structuredContent": {"x": 1}
        }));
        assert_eq!(out.text_summary(), r#"{"x":1}"#);
    }

    #[test]
    fn keeps_images_and_summarizes_them() {
        let out = ToolOutput::from_mcp_json(&json!({
            "content": [{"type": "image", "data": "AAAA", "mimeType": "image/png"}]
        }));
        assert_eq!(
            out.content[0],
            ToolContent::Image { media_type: "image/png".into(), data: "AAAA".into() }
        );
        assert_eq!(out.text_summary(), "<image/png image, 4 base64 bytes>");
    }
}
