//! Client-local tool that hands an image file to the model as base64 content.

use std::path::Path;

use async_trait::async_trait;
use base64::Engine as _;
use serde_json::{json, Value as JsonValue};

use crate::core::content::{ToolContent, ToolOutput};
use crate::core::tool::{Tool, ToolSpec};
use crate::domain::ToolError;

pub const NAME: &str = "image_reader";
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Default, Clone)]
pub struct ImageReader;

fn media_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

impl ToolSpec for ImageReader {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Read an image file (png, jpeg, gif or webp, up to 5 MiB) so it can be inspected, e.g. a path returned by the capture tool."
    }

    fn input_schema(&self) -> JsonValue {
        json!({
            "type": "object",
            "properties": {
                "image_path": {"type": "string", "description": "Path of the image file"}
            },
            "required": ["image_path"]
        })
    }
}

#[async_trait]
impl Tool for ImageReader {
    async fn call(&self, arguments: &JsonValue) -> Result<ToolOutput, ToolError> {
        let raw = arguments
            .get("image_path")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArgs("missing required field: image_path".into()))?;
        let path = Path::new(raw);
        let media_type = media_type(path)
            .ok_or_else(|| ToolError::InvalidArgs(format!("unsupported image format: {raw}")))?;

        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| ToolError::Execution(format!("{raw}: {e}")))?;
        if !meta.is_file() {
            return Err(ToolError::Execution(format!("{raw}: not a file")));
        }
        if meta.len() > MAX_IMAGE_BYTES {
            return Err(ToolError::Execution(format!(
                "{raw}: {} bytes exceeds the {MAX_IMAGE_BYTES} byte limit",
                meta.len()
            )));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ToolError::Execution(format!("{raw}: {e}")))?;
        let data = base64::engine::general_purpose::STANDARD.encode(&bytes);
        tracing::debug!(path = %raw, bytes = bytes.len(), "image read");
        Ok(ToolOutput {
            content: vec![ToolContent::Image { media_type: media_type.to_owned(), data }],
            is_error: false,
        })
    }
}
