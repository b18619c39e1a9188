pub mod blocks;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Horizontal world bound of the game (|x|, |z|).
pub const COORD_LIMIT: i64 = 30_000_000;
/// Build height range for block operations.
pub const Y_RANGE: std::ops::RangeInclusive<i64> = 0..=255;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("{0}")]
    Execution(String),
}

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("connection to the game server failed: {0}")]
    Connection(String),
    #[error("game server timed out after {0} ms")]
    Timeout(u64),
    #[error("unexpected reply from the game server: {0}")]
    Protocol(String),
    #[error("{0}")]
    InvalidArgument(String),
}

impl WorldError {
    /// Refused/reset connections are worth another attempt; protocol errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorldError::Connection(_))
    }
}

/// Integer block position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl TilePos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl std::fmt::Display for TilePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}

/// Exact entity position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<u8>,
}

impl Block {
    pub fn new(id: u8) -> Self {
        Self { id, data: None }
    }

    pub fn with_data(id: u8, data: u8) -> Self {
        Self { id, data: Some(data) }
    }
}

/// Game-control layer. The production implementation talks to the game's
/// text API; tests plug in an in-memory world.
#[async_trait::async_trait]
pub trait World: Send + Sync + 'static {
    async fn get_block(&self, pos: TilePos) -> Result<u8, WorldError>;
    async fn set_block(&self, pos: TilePos, block: Block) -> Result<(), WorldError>;
    async fn set_blocks(&self, from: TilePos, to: TilePos, block: Block) -> Result<(), WorldError>;
    /// y of the highest non-air block at (x, z).
    async fn get_height(&self, x: i32, z: i32) -> Result<i32, WorldError>;
    async fn player_pos(&self) -> Result<Vec3, WorldError>;
    async fn player_tile(&self) -> Result<TilePos, WorldError>;
    async fn set_player_pos(&self, pos: Vec3) -> Result<(), WorldError>;
    async fn set_player_tile(&self, pos: TilePos) -> Result<(), WorldError>;
    async fn post_to_chat(&self, message: &str) -> Result<(), WorldError>;
}

pub fn validate_horizontal(name: &str, value: i64) -> Result<i32, WorldError> {
    if !(-COORD_LIMIT..=COORD_LIMIT).contains(&value) {
        return Err(WorldError::InvalidArgument(format!(
            "{name} out of range: must be between -{COORD_LIMIT} and {COORD_LIMIT}, got {value}"
        )));
    }
    Ok(value as i32)
}

pub fn validate_y(name: &str, value: i64) -> Result<i32, WorldError> {
    if !Y_RANGE.contains(&value) {
        return Err(WorldError::InvalidArgument(format!(
            "{name} out of range: must be between {} and {}, got {value}",
            Y_RANGE.start(),
            Y_RANGE.end()
        )));
    }
    Ok(value as i32)
}

/// Validate an (x, y, z) triple for block operations.
pub fn validate_tile(x: i64, y: i64, z: i64) -> Result<TilePos, WorldError> {
    Ok(TilePos::new(
        validate_horizontal("x", x)?,
        validate_y("y", y)?,
        validate_horizontal("z", z)?,
    ))
}

pub fn validate_block(id: i64, data: Option<i64>) -> Result<Block, WorldError> {
    if !(0..=255).contains(&id) {
        return Err(WorldError::InvalidArgument(format!(
            "blockType must be an integer between 0 and 255, got {id}"
        )));
    }
    match data {
        None => Ok(Block::new(id as u8)),
        Some(d) if (0..=15).contains(&d) => Ok(Block::with_data(id as u8, d as u8)),
        Some(d) => Err(WorldError::InvalidArgument(format!(
            "blockData must be an integer between 0 and 15, got {d}"
        ))),
    }
}

/// Entity positions only share the horizontal bound; y is free (players fly).
pub fn validate_position(x: f64, y: f64, z: f64) -> Result<Vec3, WorldError> {
    for (name, v) in [("x", x), ("y", y), ("z", z)] {
        if !v.is_finite() || v.abs() > COORD_LIMIT as f64 {
            return Err(WorldError::InvalidArgument(format!(
                "{name} out of range: must be between -{COORD_LIMIT} and {COORD_LIMIT}, got {v}"
            )));
        }
    }
    Ok(Vec3 { x, y, z })
}
