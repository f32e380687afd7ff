//! Shared MCP protocol surface: JSON-RPC envelopes and the handshake payload.

use serde::{Deserialize, Serialize};
use serde_json::Value as J;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// --- JSON-RPC structures ---

/// Incoming request. `id` is optional on the wire; an absent id is kept as
/// `null` and still answered.
#[derive(Deserialize, Debug)]
pub struct RpcReq {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: J,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub params: J,
}

#[derive(Serialize, Debug, Clone)]
pub struct RpcResp {
    pub jsonrpc: &'static str,
    pub id: J,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<J>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErr>,
}

#[derive(Serialize, Debug, Clone)]
pub struct RpcErr {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<J>,
}

pub fn ok(id: J, result: J) -> RpcResp {
    RpcResp { jsonrpc: JSONRPC_VERSION, id, result: Some(result), error: None }
}
pub fn err(id: J, code: i32, msg: impl Into<String>, data: Option<J>) -> RpcResp {
    let error = RpcErr { code, message: msg.into(), data };
    RpcResp { jsonrpc: JSONRPC_VERSION, id, result: None, error: Some(error) }
}

// --- initialize ---

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: Capabilities,
    pub server_info: ServerInfo,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Capabilities {
    pub tools: J,
    pub resources: J,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl InitializeResult {
    pub fn for_server(info: ServerInfo) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: Capabilities {
                tools: J::Object(Default::default()),
                resources: J::Object(Default::default()),
            },
            server_info: info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_serializes_initialize_result_in_camel_case() {
        let v =
            InitializeResult::for_server(ServerInfo { name: "gw".into(), version: "0.1".into() });
        let s = serde_json::to_value(&v).unwrap();
        assert_eq!(s["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(s["serverInfo"]["name"], "gw");
        assert_eq!(s["capabilities"]["tools"], json!({}));
        assert_eq!(s["capabilities"]["resources"], json!({}));
    }

    #[test]
    fn success_and_error_are_mutually_exclusive() {
        let s = serde_json::to_value(ok(json!(7), json!({"a": 1}))).unwrap();
        assert!(s.get("error").is_none());
        assert_eq!(s["id"], 7);

        let e = serde_json::to_value(err(json!("x"), INTERNAL_ERROR, "boom", None)).unwrap();
        assert!(e.get("result").is_none());
        assert_eq!(e["error"]["code"], -32603);
        assert!(e["error"].get("data").is_none());
    }

    #[test]
    fn request_without_id_or_params_defaults_to_null() {
        let r: RpcReq = serde_json::from_str(r#"{"jsonrpc":"2.0","method":"tools/list"}"#).unwrap();
        assert!(r.id.is_null());
        assert!(r.params.is_null());
        assert_eq!(r.method, "tools/list");
    }
}
