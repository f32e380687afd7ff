use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::Instrument;

use crate::api::dispatch::dispatch;
use crate::clients::mysql::SqlConnector;
use crate::clients::pocketbase::PocketBaseClient;
use crate::core::error::{GatewayError, ToolError};
use crate::core::mcp::{RpcReq, RpcResp};
use crate::domain::{MySqlParams, PocketBaseParams};
use crate::infra::config::Config;
use crate::infra::http::json as http_json;
use crate::infra::runtime::limits::make_http_client;
use crate::tools::mysql::MySqlTools;
use crate::tools::pocketbase::PocketBaseTools;

/// Shared, read-only handler state. Backend handles are never stored here;
/// each request builds its own from the query string.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sql: Arc<dyn SqlConnector>,
}

impl AppState {
    pub fn new(config: Config, sql: Arc<dyn SqlConnector>) -> Self {
        Self { config: Arc::new(config), sql }
    }
}

fn parse_request(body: &[u8]) -> Result<RpcReq, GatewayError> {
    let raw: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| GatewayError::Parse(e.to_string()))?;
    if !raw.is_object() {
        return Err(GatewayError::Parse("request must be a JSON object".into()));
    }
    serde_json::from_value(raw).map_err(|e| GatewayError::Parse(e.to_string()))
}

async fn pocketbase_backend(
    state: &AppState,
    q: &HashMap<String, String>,
) -> Result<PocketBaseTools, GatewayError> {
    let params = PocketBaseParams::from_query(q)?;
    let http = make_http_client(&state.config.http).map_err(ToolError::from)?;
    let client = PocketBaseClient::connect(&params, http).await?;
    Ok(PocketBaseTools::new(client))
}

async fn mysql_backend(
    state: &AppState,
    q: &HashMap<String, String>,
) -> Result<MySqlTools, GatewayError> {
    let params = MySqlParams::from_query(q, &state.config.mysql)?;
    tracing::debug!(?params, "opening mysql connection");
    let db = state.sql.connect(&params).await?;
    Ok(MySqlTools::new(db))
}

/// POST /pocketbase
pub async fn pocketbase(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
    body: Bytes,
) -> Json<RpcResp> {
    let req = match parse_request(&body) {
        Ok(r) => r,
        Err(e) => return http_json::parse_error(e.to_string()),
    };
    let span =
        tracing::info_span!("rpc", variant = "pocketbase", method = %req.method, id = %req.id);
    async move {
        match pocketbase_backend(&state, &q).await {
            Ok(backend) => Json(dispatch(&backend, "pocketbase", req).await),
            Err(e) => {
                tracing::warn!(error = %e, "pocketbase setup failed");
                http_json::from_gateway_error(req.id, e)
            }
        }
    }
    .instrument(span)
    .await
}

/// POST /mysql
pub async fn mysql(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
    body: Bytes,
) -> Json<RpcResp> {
    let req = match parse_request(&body) {
        Ok(r) => r,
        Err(e) => return http_json::parse_error(e.to_string()),
    };
    let span = tracing::info_span!("rpc", variant = "mysql", method = %req.method, id = %req.id);
    async move {
        match mysql_backend(&state, &q).await {
            Ok(backend) => Json(dispatch(&backend, "mysql", req).await),
            Err(e) => {
                tracing::warn!(error = %e, "mysql setup failed");
                http_json::from_gateway_error(req.id, e)
            }
        }
    }
    .instrument(span)
    .await
}

/// OPTIONS on either endpoint: empty 200, CORS headers come from the middleware.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}
