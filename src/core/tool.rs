use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::error::ToolError;
use crate::core::mcp::ServerInfo;
use crate::domain::Resource;
use crate::tools::registry::ToolRegistry;

pub type JsonObject = Map<String, Value>;

/// Static metadata every tool exposes through `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }

    /// Presence check only: a required key must exist and not be `null`.
    pub fn check_required(&self, args: &JsonObject) -> Result<(), ToolError> {
        for key in self.required() {
            if args.get(key).map_or(true, Value::is_null) {
                return Err(ToolError::MissingArgument(key.to_string()));
            }
        }
        Ok(())
    }
}

/// One MCP variant: a fixed tool table plus the backend it forwards to.
/// Instances live for a single HTTP request.
#[async_trait]
pub trait McpBackend: Send + Sync {
    fn server_info(&self) -> ServerInfo;
    fn registry(&self) -> &'static ToolRegistry;
    async fn call_tool(&self, name: &str, args: &JsonObject) -> Result<Value, ToolError>;
    async fn list_resources(&self) -> Result<Vec<Resource>, ToolError>;
    async fn read_resource(&self, uri: &str) -> Result<Value, ToolError>;
}

pub fn str_arg<'a>(args: &'a JsonObject, key: &str) -> Result<&'a str, ToolError> {
    match args.get(key) {
        Some(Value::String(s)) => Ok(s),
        None | Some(Value::Null) => Err(ToolError::MissingArgument(key.to_string())),
        Some(_) => Err(ToolError::Validation(format!("Parameter '{key}' must be a string"))),
    }
}

pub fn object_arg<'a>(args: &'a JsonObject, key: &str) -> Result<&'a JsonObject, ToolError> {
    match args.get(key) {
        Some(Value::Object(o)) => Ok(o),
        None | Some(Value::Null) => Err(ToolError::MissingArgument(key.to_string())),
        Some(_) => Err(ToolError::Validation(format!("Parameter '{key}' must be an object"))),
    }
}
