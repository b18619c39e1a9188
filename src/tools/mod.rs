pub mod image_reader;
pub mod mcp_remote;
pub mod minecraft;
pub mod registry;
