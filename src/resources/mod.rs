//! Backend entities exposed as MCP resources under synthetic URIs.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::core::error::ToolError;
use crate::domain::Resource;

const COLLECTION_PREFIX: &str = "pocketbase://collection/";
const TABLE_PREFIX: &str = "mysql://table/";

static COLLECTION_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^pocketbase://collection/(.+)$").expect("collection uri pattern")
});
static TABLE_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^mysql://table/(.+)$").expect("table uri pattern"));

fn capture<'a>(re: &Regex, uri: &'a str) -> Result<&'a str, ToolError> {
    re.captures(uri)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| ToolError::InvalidResourceUri(uri.to_string()))
}

pub fn parse_collection_uri(uri: &str) -> Result<&str, ToolError> {
    capture(&COLLECTION_URI, uri)
}

pub fn parse_table_uri(uri: &str) -> Result<&str, ToolError> {
    capture(&TABLE_URI, uri)
}

/// Map a PocketBase collection listing (`{items:[...]}` or a bare array) to resources.
pub fn collections_to_resources(listing: &Value) -> Vec<Resource> {
    let items = listing
        .get("items")
        .and_then(Value::as_array)
        .or_else(|| listing.as_array());
    items
        .into_iter()
        .flatten()
        .filter_map(|item| {
            let name = item.get("name").and_then(Value::as_str)?;
            let kind = item.get("type").and_then(Value::as_str).unwrap_or("base");
            Some(Resource::json(
                format!("{COLLECTION_PREFIX}{name}"),
                name,
                format!("PocketBase {kind} collection: {name}"),
            ))
        })
        .collect()
}

pub fn tables_to_resources(tables: &[String]) -> Vec<Resource> {
    tables
        .iter()
        .map(|name| {
            Resource::json(format!("{TABLE_PREFIX}{name}"), name, format!("MySQL table: {name}"))
        })
        .collect()
}
