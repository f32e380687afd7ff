use axum::Json;
use serde::Serialize;
use serde_json::Value as J;

use crate::core::error::{GatewayError, ToolError};
use crate::core::mcp::{err as rpc_err, ok as rpc_ok, RpcResp, PARSE_ERROR};

/// Serialize a typed result payload into a success envelope.
pub fn ok_typed<T: Serialize>(id: J, result: &T) -> RpcResp {
    match serde_json::to_value(result) {
        Ok(v) => rpc_ok(id, v),
        Err(e) => from_tool_error(id, ToolError::Backend(format!("serialization failed: {e}"))),
    }
}

pub fn error(id: J, code: i32, message: impl Into<String>) -> Json<RpcResp> {
    Json(rpc_err(id, code, message, None))
}

pub fn parse_error(message: impl Into<String>) -> Json<RpcResp> {
    error(J::Null, PARSE_ERROR, message)
}

pub fn from_tool_error(id: J, err: ToolError) -> RpcResp {
    rpc_err(id, err.rpc_code(), err.to_string(), None)
}

/// Map a GatewayError into a JSON-RPC error response using its own code.
pub fn from_gateway_error(id: J, err: GatewayError) -> Json<RpcResp> {
    error(id, err.rpc_code(), err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json as AxumJson;
    use serde_json::json;

    #[test]
    fn wraps_typed_result_in_json_rpc_envelope() {
        let resp = ok_typed(json!(1), &json!({"x": 1}));
        assert_eq!(resp.jsonrpc, "2.0");
        assert!(resp.error.is_none());
        assert_eq!(resp.result.unwrap()["x"], 1);
    }

    #[test]
    fn wraps_error_response_in_json_rpc_envelope() {
        let AxumJson(resp) = error(J::Null, -32601, "method not found");
        assert_eq!(resp.jsonrpc, "2.0");
        assert!(resp.result.is_none());
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32601);
        assert!(err.message.contains("method not found"));
    }

    #[test]
    fn builds_parse_error_with_null_id() {
        let AxumJson(resp) = parse_error("bad json");
        assert!(resp.id.is_null());
        assert!(resp.result.is_none());
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32700);
        assert!(err.message.contains("bad json"));
    }

    #[test]
    fn gateway_errors_keep_id_and_code() {
        let AxumJson(resp) = from_gateway_error(json!(42), GatewayError::MissingParam("url"));
        assert_eq!(resp.id, json!(42));
        assert_eq!(resp.error.unwrap().code, -32602);
    }

    #[test]
    fn tool_errors_map_codes() {
        let resp = from_tool_error(json!("a"), ToolError::UnknownTool("nope".into()));
        assert_eq!(resp.error.unwrap().code, -32602);
        let resp = from_tool_error(json!("a"), ToolError::Backend("nope".into()));
        assert_eq!(resp.error.unwrap().code, -32603);
    }
}
