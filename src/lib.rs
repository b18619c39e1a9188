//! Minecraft world tools over MCP, plus the model-driven agent that uses them.
//!
//! `serve` runs the MCP tool server in front of the game's text API;
//! `chat` spawns the configured MCP servers and runs the agent loop.

pub mod agent;
pub mod cli;
pub mod clients;
pub mod core;
pub mod domain;
pub mod infra;
pub mod tools;
