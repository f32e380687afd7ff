use axum::{
    middleware::map_response,
    routing::{get, post},
    Router,
};

use crate::api::{docs, mcp, mcp::AppState};
use crate::infra::http::headers::add_cors_headers;

/// `/healthz` plus one JSON-RPC endpoint per backend. Non-POST, non-OPTIONS
/// requests to an endpoint get its documentation page.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route(
            "/pocketbase",
            post(mcp::pocketbase).options(mcp::preflight).fallback(docs::pocketbase),
        )
        .route("/mysql", post(mcp::mysql).options(mcp::preflight).fallback(docs::mysql))
        .layer(map_response(add_cors_headers))
        .with_state(state)
}
