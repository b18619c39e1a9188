use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    minecraft_mcp_gateway::cli::run().await
}
