pub mod anthropic;
pub mod capture;
pub mod mcp_servers;
pub mod mcpi;
