use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::mcp::AppState;
use crate::clients::mysql::MySqlConnector;
use crate::infra::config::Config;

pub async fn run_server(cfg: Config) -> anyhow::Result<()> {
    cfg.validate().map_err(anyhow::Error::msg)?;
    tracing::info!(
        port = cfg.port,
        mysql_host = %cfg.mysql.host,
        mysql_port = cfg.mysql.port,
        http_timeout_ms = cfg.http.timeout_ms,
        "BOOT mcp-db-gateway"
    );

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let app = crate::infra::http_app::build_app(AppState::new(cfg, Arc::new(MySqlConnector)));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
