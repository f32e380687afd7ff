use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    mcp_db_gateway::infra::logging::init();
    mcp_db_gateway::cli::run().await
}
