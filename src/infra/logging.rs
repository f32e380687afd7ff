use std::time::Duration;

pub fn init() {
    // Initialize tracing subscriber once, honoring RUST_LOG if set.
    // Default to info level; allow override via RUST_LOG (e.g., "debug").
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

/// Count one JSON-RPC request per variant and method.
pub fn record_request(variant: &'static str, method: &str) {
    metrics::counter!(
        "mcp_requests_total",
        "variant" => variant,
        "method" => method.to_string()
    )
    .increment(1);
}

/// Record outcome and latency of a tool call; mirrored to the log until an exporter is added.
pub fn record_tool_call(variant: &'static str, tool: &str, ok: bool, elapsed: Duration) {
    let outcome = if ok { "ok" } else { "error" };
    let elapsed_ms = elapsed.as_secs_f64() * 1_000.0;
    metrics::counter!(
        "mcp_tool_calls_total",
        "variant" => variant,
        "tool" => tool.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "mcp_tool_latency_ms",
        "variant" => variant,
        "tool" => tool.to_string()
    )
    .record(elapsed_ms);
    tracing::info!(variant, tool, outcome, elapsed_ms, "tool call");
}
