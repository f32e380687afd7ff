//! Content blocks returned to MCP clients.

use serde::Serialize;
use serde_json::Value as JsonValue;

pub const JSON_MIME: &str = "application/json";

/// Pretty-print a backend payload the way every text block carries it.
pub fn pretty(value: &JsonValue) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[derive(Debug, Clone, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// `tools/call` result: `{content:[{type:"text", text}]}`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub content: Vec<TextContent>,
}

impl ToolResult {
    pub fn json(value: &JsonValue) -> Self {
        Self { content: vec![TextContent { kind: "text", text: pretty(value) }] }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContent {
    pub uri: String,
    pub mime_type: &'static str,
    pub text: String,
}

/// `resources/read` result: `{contents:[{uri, mimeType, text}]}`.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceRead {
    pub contents: Vec<ResourceContent>,
}

impl ResourceRead {
    pub fn json(uri: impl Into<String>, value: &JsonValue) -> Self {
        let content = ResourceContent {
            uri: uri.into(),
            mime_type: JSON_MIME,
            text: pretty(value),
        };
        Self { contents: vec![content] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_result_wraps_pretty_json_text() {
        let v = serde_json::to_value(ToolResult::json(&json!({"id": "abc"}))).unwrap();
        assert_eq!(v["content"][0]["type"], "text");
        let text = v["content"][0]["text"].as_str().unwrap();
        assert!(text.contains('\n'));
        let back: JsonValue = serde_json::from_str(text).unwrap();
        assert_eq!(back["id"], "abc");
    }

    #[test]
    fn resource_read_carries_uri_and_mime() {
        let read = ResourceRead::json("mysql://table/users", &json!([]));
        let v = serde_json::to_value(read).unwrap();
        assert_eq!(v["contents"][0]["uri"], "mysql://table/users");
        assert_eq!(v["contents"][0]["mimeType"], "application/json");
        assert_eq!(v["contents"][0]["text"], "[]");
    }
}
