use std::future::Future;
use std::sync::Arc;

use rmcp::handler::server::tool::{Parameters, ToolRouter};
use rmcp::model::{CallToolResult, Content, JsonObject, ServerCapabilities, ServerInfo};
use rmcp::ErrorData as McpError;
use serde_json::{json, Value as JsonValue};

use crate::clients::capture::ScreenCapture;
use crate::domain::{
    blocks, validate_block, validate_horizontal, validate_position, validate_tile, World, WorldError,
};
use crate::infra::logging::log_metric;
use crate::infra::runtime::mcp_transport::ServerHandler;

/// MCP face of the game world.
#[derive(Clone)]
pub struct MinecraftSvc {
    world: Arc<dyn World>,
    screen: ScreenCapture,
}

impl MinecraftSvc {
    pub fn new(world: Arc<dyn World>, screen: ScreenCapture) -> Self {
        Self { world, screen }
    }
}

impl ServerHandler for MinecraftSvc {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Tools for reading and editing a Minecraft: Pi Edition world. Coordinates are \
                 block coordinates; y is height (0-255 for blocks). Use getBlockTypes for block ids."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

fn missing(key: &str) -> McpError {
    McpError::invalid_params(format!("missing required field: {key}"), None)
}

fn as_int(v: &JsonValue) -> Option<i64> {
    v.as_i64()
        .or_else(|| v.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 1e15).map(|f| f as i64))
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
}

fn int_arg(args: &JsonObject, key: &str) -> Result<i64, McpError> {
    match args.get(key) {
        None | Some(JsonValue::Null) => Err(missing(key)),
        Some(v) => as_int(v)
            .ok_or_else(|| McpError::invalid_params(format!("{key} must be an integer"), None)),
    }
}

fn opt_int_arg(args: &JsonObject, key: &str) -> Result<Option<i64>, McpError> {
    match args.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(_) => int_arg(args, key).map(Some),
    }
}

fn num_arg(args: &JsonObject, key: &str) -> Result<f64, McpError> {
    let v = args.get(key).filter(|v| !v.is_null()).ok_or_else(|| missing(key))?;
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| McpError::invalid_params(format!("{key} must be a number"), None))
}

fn flag_arg(args: &JsonObject, key: &str) -> Result<bool, McpError> {
    match args.get(key) {
        None | Some(JsonValue::Null) => Ok(false),
        Some(JsonValue::Bool(b)) => Ok(*b),
        Some(_) => Err(McpError::invalid_params(format!("{key} must be a boolean"), None)),
    }
}

fn world_err(tool: &str, e: WorldError) -> McpError {
    match e {
        WorldError::InvalidArgument(msg) => McpError::invalid_params(msg, None),
        other => {
            tracing::warn!(tool, error = %other, "world call failed");
            McpError::internal_error(other.to_string(), None)
        }
    }
}

fn text(s: impl Into<String>) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(s.into())]))
}

#[rmcp::tool_router]
impl MinecraftSvc {
    #[rmcp::tool(
        name = "getBlock",
        description = "Get the block at coordinates (x, y, z). Returns JSON {x, y, z, blockType, name}."
    )]
    async fn get_block(&self, params: Parameters<JsonObject>) -> Result<CallToolResult, McpError> {
        log_metric("getBlock", "tool_calls_total", 1.0);
        let args = &params.0;
        let pos = validate_tile(int_arg(args, "x")?, int_arg(args, "y")?, int_arg(args, "z")?)
            .map_err(|e| world_err("getBlock", e))?;
        let id = self.world.get_block(pos).await.map_err(|e| world_err("getBlock", e))?;
        let body = json!({
            "x": pos.x, "y": pos.y, "z": pos.z,
            "blockType": id,
            "name": blocks::block_name(id),
        });
        text(body.to_string())
    }

    #[rmcp::tool(
        name = "setBlock",
        description = "Place one block at (x, y, z). blockType is a block id 0-255 (see getBlockTypes); optional blockData 0-15 selects a variant such as wool colour."
    )]
    async fn set_block(&self, params: Parameters<JsonObject>) -> Result<CallToolResult, McpError> {
        log_metric("setBlock", "tool_calls_total", 1.0);
        let args = &params.0;
        let pos = validate_tile(int_arg(args, "x")?, int_arg(args, "y")?, int_arg(args, "z")?)
            .map_err(|e| world_err("setBlock", e))?;
        let block = validate_block(int_arg(args, "blockType")?, opt_int_arg(args, "blockData")?)
            .map_err(|e| world_err("setBlock", e))?;
        self.world.set_block(pos, block).await.map_err(|e| world_err("setBlock", e))?;
        text(format!("Placed {} at {pos}", blocks::describe(block.id)))
    }

    #[rmcp::tool(
        name = "setBlocks",
        description = "Fill the cuboid between corners (x0, y0, z0) and (x1, y1, z1) with one block type. blockType is a block id 0-255; optional blockData 0-15. Use blockType 0 (Air) to clear an area."
    )]
    async fn set_blocks(&self, params: Parameters<JsonObject>) -> Result<CallToolResult, McpError> {
        log_metric("setBlocks", "tool_calls_total", 1.0);
        let args = &params.0;
        let from = validate_tile(int_arg(args, "x0")?, int_arg(args, "y0")?, int_arg(args, "z0")?)
            .map_err(|e| world_err("setBlocks", e))?;
        let to = validate_tile(int_arg(args, "x1")?, int_arg(args, "y1")?, int_arg(args, "z1")?)
            .map_err(|e| world_err("setBlocks", e))?;
        let block = validate_block(int_arg(args, "blockType")?, opt_int_arg(args, "blockData")?)
            .map_err(|e| world_err("setBlocks", e))?;
        self.world
            .set_blocks(from, to, block)
            .await
            .map_err(|e| world_err("setBlocks", e))?;
        text(format!("Placed {} from {from} to {to}", blocks::describe(block.id)))
    }

    #[rmcp::tool(
        name = "getHeight",
        description = "Get the y coordinate of the highest non-air block at column (x, z)."
    )]
    async fn get_height(&self, params: Parameters<JsonObject>) -> Result<CallToolResult, McpError> {
        log_metric("getHeight", "tool_calls_total", 1.0);
        let args = &params.0;
        let x = validate_horizontal("x", int_arg(args, "x")?).map_err(|e| world_err("getHeight", e))?;
        let z = validate_horizontal("z", int_arg(args, "z")?).map_err(|e| world_err("getHeight", e))?;
        let y = self.world.get_height(x, z).await.map_err(|e| world_err("getHeight", e))?;
        text(y.to_string())
    }

    #[rmcp::tool(
        name = "getPlayerPos",
        description = "Get the player's position as JSON {x, y, z}. With tile=true the integer block position is returned instead of the exact one."
    )]
    async fn get_player_pos(&self, params: Parameters<JsonObject>) -> Result<CallToolResult, McpError> {
        log_metric("getPlayerPos", "tool_calls_total", 1.0);
        let body = if flag_arg(&params.0, "tile")? {
            let p = self.world.player_tile().await.map_err(|e| world_err("getPlayerPos", e))?;
            json!({"x": p.x, "y": p.y, "z": p.z})
        } else {
            let p = self.world.player_pos().await.map_err(|e| world_err("getPlayerPos", e))?;
            json!({"x": p.x, "y": p.y, "z": p.z})
        };
        text(body.to_string())
    }

    #[rmcp::tool(
        name = "setPlayerPos",
        description = "Move the player to (x, y, z). With tile=true the coordinates are rounded down to a block position."
    )]
    async fn set_player_pos(&self, params: Parameters<JsonObject>) -> Result<CallToolResult, McpError> {
        log_metric("setPlayerPos", "tool_calls_total", 1.0);
        let args = &params.0;
        let pos = validate_position(num_arg(args, "x")?, num_arg(args, "y")?, num_arg(args, "z")?)
            .map_err(|e| world_err("setPlayerPos", e))?;
        if flag_arg(args, "tile")? {
            let tile = crate::domain::TilePos::new(
                pos.x.floor() as i32,
                pos.y.floor() as i32,
                pos.z.floor() as i32,
            );
            self.world
                .set_player_tile(tile)
                .await
                .map_err(|e| world_err("setPlayerPos", e))?;
            return text(format!("Moved player to {tile}"));
        }
        self.world
            .set_player_pos(pos)
            .await
            .map_err(|e| world_err("setPlayerPos", e))?;
        text(format!("Moved player to ({},{},{})", pos.x, pos.y, pos.z))
    }

    #[rmcp::tool(name = "postToChat", description = "Post a message to the in-game chat.")]
    async fn post_to_chat(&self, params: Parameters<JsonObject>) -> Result<CallToolResult, McpError> {
        log_metric("postToChat", "tool_calls_total", 1.0);
        let message = params
            .0
            .get("message")
            .and_then(|v| v.as_str())
            .ok_or_else(|| missing("message"))?;
        if message.trim().is_empty() {
            return Err(McpError::invalid_params("message must not be empty", None));
        }
        self.world
            .post_to_chat(message)
            .await
            .map_err(|e| world_err("postToChat", e))?;
        text(format!("Posted to chat: {message}"))
    }

    #[rmcp::tool(
        name = "capture",
        description = "Take a screenshot of the game window and return the path of the saved PNG. Pass the path to image_reader to look at it."
    )]
    async fn capture(&self) -> Result<CallToolResult, McpError> {
        log_metric("capture", "tool_calls_total", 1.0);
        let path = self.screen.capture().await.map_err(|e| {
            tracing::warn!(error = %e, "capture failed");
            McpError::internal_error(e.to_string(), None)
        })?;
        let path = tokio::fs::canonicalize(&path).await.unwrap_or(path);
        text(path.display().to_string())
    }

    #[rmcp::tool(
        name = "getBlockTypes",
        description = "List every block id with its name, one 'id: name' per line."
    )]
    async fn get_block_types(&self) -> Result<CallToolResult, McpError> {
        text(blocks::catalog_text())
    }
}

pub type MinecraftRouter = ToolRouter<MinecraftSvc>;

fn schema(v: JsonValue) -> Arc<JsonObject> {
    Arc::new(v.as_object().cloned().unwrap_or_default())
}

fn int_props(names: &[&str]) -> serde_json::Map<String, JsonValue> {
    names
        .iter()
        .map(|n| (n.to_string(), json!({"type": "integer"})))
        .collect()
}

/// Argument schemas advertised in `tools/list`.
fn input_schema(tool: &str) -> Option<Arc<JsonObject>> {
    let block = json!({"type": "integer", "minimum": 0, "maximum": 255, "description": "Block id"});
    let data = json!({"type": "integer", "minimum": 0, "maximum": 15, "description": "Block variant"});
    let v = match tool {
        "getBlock" => json!({"type": "object", "properties": int_props(&["x", "y", "z"]), "required": ["x", "y", "z"]}),
        "setBlock" => {
            let mut props = int_props(&["x", "y", "z"]);
            props.insert("blockType".into(), block);
            props.insert("blockData".into(), data);
            json!({"type": "object", "properties": props, "required": ["x", "y", "z", "blockType"]})
        }
        "setBlocks" => {
            let mut props = int_props(&["x0", "y0", "z0", "x1", "y1", "z1"]);
            props.insert("blockType".into(), block);
            props.insert("blockData".into(), data);
            json!({"type": "object", "properties": props,
                   "required": ["x0", "y0", "z0", "x1", "y1", "z1", "blockType"]})
        }
        "getHeight" => json!({"type": "object", "properties": int_props(&["x", "z"]), "required": ["x", "z"]}),
        "getPlayerPos" => json!({"type": "object", "properties": {"tile": {"type": "boolean"}}, "required": []}),
        "setPlayerPos" => json!({"type": "object", "properties": {
            "x": {"type": "number"}, "y": {"type": "number"}, "z": {"type": "number"},
            "tile": {"type": "boolean"}
        }, "required": ["x", "y", "z"]}),
        "postToChat" => json!({"type": "object", "properties": {"message": {"type": "string"}}, "required": ["message"]}),
        "capture" | "getBlockTypes" => json!({"type": "object", "properties": {}, "required": []}),
        _ => return None,
    };
    Some(schema(v))
}

impl MinecraftSvc {
    pub fn router() -> MinecraftRouter {
        let mut router = Self::tool_router();
        for route in router.map.values_mut() {
            if let Some(s) = input_schema(&route.attr.name) {
                route.attr.input_schema = s;
            }
        }
        router
    }
}
