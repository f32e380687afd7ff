use std::time::Instant;

use serde_json::{json, Value as J};

use crate::core::content::{ResourceRead, ToolResult};
use crate::core::error::ToolError;
use crate::core::mcp::{
    err as rpc_err, ok as rpc_ok, InitializeResult, RpcReq, RpcResp, METHOD_NOT_FOUND,
};
use crate::core::tool::{JsonObject, McpBackend};
use crate::infra::http::json::{from_tool_error, ok_typed};
use crate::infra::logging::{record_request, record_tool_call};

async fn call_tool(
    backend: &dyn McpBackend,
    variant: &'static str,
    params: &J,
) -> Result<J, ToolError> {
    let name = params
        .get("name")
        .and_then(J::as_str)
        .ok_or_else(|| ToolError::InvalidParams("missing tool name".into()))?;
    let args: JsonObject = match params.get("arguments") {
        None | Some(J::Null) => JsonObject::new(),
        Some(J::Object(o)) => o.clone(),
        Some(_) => return Err(ToolError::InvalidParams("arguments must be an object".into())),
    };
    backend.registry().resolve(name, &args)?;

    tracing::debug!(tool = name, "tools/call");
    let start = Instant::now();
    let res = backend.call_tool(name, &args).await;
    record_tool_call(variant, name, res.is_ok(), start.elapsed());
    if let Err(e) = &res {
        tracing::warn!(tool = name, error = %e, "tool call failed");
    }
    res
}

async fn read_resource(backend: &dyn McpBackend, params: &J) -> Result<ResourceRead, ToolError> {
    let uri = params
        .get("uri")
        .and_then(J::as_str)
        .ok_or_else(|| ToolError::InvalidParams("missing resource uri".into()))?;
    let payload = backend.read_resource(uri).await?;
    Ok(ResourceRead::json(uri, &payload))
}

/// Route one parsed JSON-RPC request to its handler. Always yields exactly one response
/// carrying the request's id.
pub async fn dispatch(backend: &dyn McpBackend, variant: &'static str, req: RpcReq) -> RpcResp {
    let id = req.id;
    record_request(variant, &req.method);
    let resp = match req.method.as_str() {
        "initialize" => ok_typed(id, &InitializeResult::for_server(backend.server_info())),
        "ping" => rpc_ok(id, json!({})),
        "tools/list" => rpc_ok(id, backend.registry().list()),
        "tools/call" => match call_tool(backend, variant, &req.params).await {
            Ok(out) => ok_typed(id, &ToolResult::json(&out)),
            Err(e) => from_tool_error(id, e),
        },
        "resources/list" => match backend.list_resources().await {
            Ok(resources) => rpc_ok(id, json!({ "resources": resources })),
            Err(e) => from_tool_error(id, e),
        },
        "resources/read" => match read_resource(backend, &req.params).await {
            Ok(read) => ok_typed(id, &read),
            Err(e) => from_tool_error(id, e),
        },
        other => rpc_err(id, METHOD_NOT_FOUND, format!("Method not found: {other}"), None),
    };
    if let Some(e) = &resp.error {
        tracing::debug!(code = e.code, message = %e.message, "rpc error response");
    }
    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mcp::ServerInfo;
    use crate::core::tool::ToolDescriptor;
    use crate::domain::Resource;
    use crate::tools::registry::ToolRegistry;
    use async_trait::async_trait;
    use std::sync::LazyLock;

    static ECHO_REGISTRY: LazyLock<ToolRegistry> = LazyLock::new(|| {
        ToolRegistry::new(vec![
            ToolDescriptor {
                name: "echo",
                description: "echo arguments",
                input_schema: json!({
                    "type": "object",
                    "properties": {"x": {"type": "string"}},
                    "required": ["x"]
                }),
            },
            ToolDescriptor {
                name: "fail",
                description: "always fails",
                input_schema: json!({"type": "object", "properties": {}, "required": []}),
            },
        ])
    });

    struct Echo;

    #[async_trait]
    impl McpBackend for Echo {
        fn server_info(&self) -> ServerInfo {
            ServerInfo { name: "echo".into(), version: "0.0.1".into() }
        }
        fn registry(&self) -> &'static ToolRegistry {
            &ECHO_REGISTRY
        }
        async fn call_tool(&self, name: &str, args: &JsonObject) -> Result<J, ToolError> {
            match name {
                "echo" => Ok(J::Object(args.clone())),
                _ => Err(ToolError::Backend("backend exploded".into())),
            }
        }
        async fn list_resources(&self) -> Result<Vec<Resource>, ToolError> {
            Err(ToolError::Backend("listing failed".into()))
        }
        async fn read_resource(&self, uri: &str) -> Result<J, ToolError> {
            if uri == "echo://thing" {
                Ok(json!({"thing": true}))
            } else {
                Err(ToolError::InvalidResourceUri(uri.into()))
            }
        }
    }

    fn req(v: J) -> RpcReq {
        serde_json::from_value(v).unwrap()
    }

    async fn run(v: J) -> J {
        serde_json::to_value(dispatch(&Echo, "test", req(v)).await).unwrap()
    }

    #[tokio::test]
    async fn initialize_reports_protocol_and_server() {
        let r = run(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"})).await;
        assert_eq!(r["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(r["result"]["serverInfo"]["name"], "echo");
        assert!(r["result"]["capabilities"]["resources"].is_object());
    }

    #[tokio::test]
    async fn tool_result_is_pretty_json_text() {
        let r = run(json!({
            "id": 42,
            "method": "tools/call",
            "params": {"name": "echo", "arguments": {"x": "y"}}
        }))
        .await;
        assert_eq!(r["id"], 42);
        assert_eq!(r["result"]["content"][0]["type"], "text");
        let text: J =
            serde_json::from_str(r["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(text, json!({"x": "y"}));
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_params() {
        let r = run(json!({
            "id": 42,
            "method": "tools/call",
            "params": {"name": "nope", "arguments": {}}
        }))
        .await;
        assert_eq!(r["id"], 42);
        assert_eq!(r["error"]["code"], -32602);
        assert!(r.get("result").is_none());
    }

    #[tokio::test]
    async fn missing_required_argument_is_internal_error() {
        let r = run(json!({"id": "a", "method": "tools/call", "params": {"name": "echo"}})).await;
        assert_eq!(r["error"]["code"], -32603);
        assert_eq!(r["error"]["message"], "Missing required parameter: x");
    }

    #[tokio::test]
    async fn backend_failure_surfaces_message() {
        let r = run(json!({"id": 3, "method": "tools/call", "params": {"name": "fail"}})).await;
        assert_eq!(r["error"]["code"], -32603);
        assert_eq!(r["error"]["message"], "backend exploded");
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let r = run(json!({"id": 42, "method": "tools/destroy"})).await;
        assert_eq!(r["error"]["code"], -32601);
        assert_eq!(r["id"], 42);
    }

    #[tokio::test]
    async fn resource_listing_failure_is_an_error_not_empty_list() {
        let r = run(json!({"id": 5, "method": "resources/list"})).await;
        assert_eq!(r["error"]["code"], -32603);
        assert!(r.get("result").is_none());
    }

    #[tokio::test]
    async fn resource_read_wraps_contents() {
        let r =
            run(json!({"id": 6, "method": "resources/read", "params": {"uri": "echo://thing"}}))
                .await;
        assert_eq!(r["result"]["contents"][0]["uri"], "echo://thing");
        let text: J =
            serde_json::from_str(r["result"]["contents"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(text["thing"], true);

        let r = run(json!({"id": 7, "method": "resources/read", "params": {"uri": "bogus"}})).await;
        assert_eq!(r["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn tools_list_is_registry_order() {
        let r = run(json!({"id": null, "method": "tools/list"})).await;
        assert!(r["id"].is_null());
        assert_eq!(r["result"]["tools"][0]["name"], "echo");
        assert_eq!(r["result"]["tools"][1]["name"], "fail");
    }
}
