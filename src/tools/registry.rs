use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value as JsonValue};

use crate::agent::provider::ToolDefinition;
use crate::core::content::ToolOutput;
use crate::core::tool::Tool;
use crate::domain::ToolError;

/// Tools the agent may call, keyed by name, in registration order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool; a second tool with the same name is rejected.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_owned();
        if self.by_name.contains_key(&name) {
            return Err(ToolError::InvalidArgs(format!("duplicate tool name: {name}")));
        }
        self.by_name.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_owned(),
                description: t.description().to_owned(),
                input_schema: normalize_schema(t.input_schema()),
            })
            .collect()
    }

    pub async fn call(&self, name: &str, args: &JsonValue) -> Result<ToolOutput, ToolError> {
        let idx = self
            .by_name
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_owned()))?;
        self.tools[*idx].call(args).await
    }
}

/// Reduce a tool's JSON schema to the object shape the model expects.
pub fn normalize_schema(schema: JsonValue) -> JsonValue {
    let properties = schema
        .get("properties")
        .filter(|p| p.is_object())
        .cloned()
        .unwrap_or_else(|| json!({}));
    let required = schema
        .get("required")
        .filter(|r| r.is_array())
        .cloned()
        .unwrap_or_else(|| json!([]));
    json!({"type": "object", "properties": properties, "required": required})
}
