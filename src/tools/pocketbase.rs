use std::sync::LazyLock;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::clients::pocketbase::{forward_query, PocketBaseClient};
use crate::core::error::ToolError;
use crate::core::mcp::ServerInfo;
use crate::core::tool::{object_arg, str_arg, JsonObject, McpBackend, ToolDescriptor};
use crate::domain::Resource;
use crate::resources::{collections_to_resources, parse_collection_uri};
use crate::tools::registry::ToolRegistry;

pub const SERVER_NAME: &str = "pocketbase-mcp";

const LIST_COLLECTION_KEYS: [&str; 5] = ["page", "perPage", "sort", "filter", "fields"];
const LIST_RECORD_KEYS: [&str; 6] = ["page", "perPage", "sort", "filter", "expand", "fields"];
const RECORD_VIEW_KEYS: [&str; 2] = ["expand", "fields"];
const COLLECTION_BODY_KEYS: [&str; 12] = [
    "name",
    "type",
    "fields",
    "indexes",
    "listRule",
    "viewRule",
    "createRule",
    "updateRule",
    "deleteRule",
    "authRule",
    "manageRule",
    "viewQuery",
];

pub static REGISTRY: LazyLock<ToolRegistry> = LazyLock::new(|| ToolRegistry::new(descriptors()));

fn descriptors() -> Vec<ToolDescriptor> {
    let collection = json!({ "type": "string", "description": "Collection name or id" });
    let record_id = json!({ "type": "string", "description": "Record id" });
    let expand = json!({ "type": "string", "description": "Comma separated relations to expand" });
    let fields = json!({ "type": "string", "description": "Comma separated fields to return" });
    let page = json!({ "type": "number", "description": "Page number (starts at 1)" });
    let per_page = json!({ "type": "number", "description": "Items per page" });
    let sort = json!({ "type": "string", "description": "Sort expression, e.g. -created,title" });
    let filter = json!({ "type": "string", "description": "PocketBase filter expression" });
    let rule = |what: &str| {
        json!({
            "type": ["string", "null"],
            "description": format!("API rule for {what} (null = superusers only)")
        })
    };

    vec![
        ToolDescriptor {
            name: "health",
            description: "Check the health of the PocketBase server",
            input_schema: json!({ "type": "object", "properties": {}, "required": [] }),
        },
        ToolDescriptor {
            name: "list_collections",
            description: "List collections",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "page": page,
                    "perPage": per_page,
                    "sort": sort,
                    "filter": filter,
                    "fields": fields
                },
                "required": []
            }),
        },
        ToolDescriptor {
            name: "view_collection",
            description: "View a single collection, including its fields",
            input_schema: json!({
                "type": "object",
                "properties": { "collection": collection },
                "required": ["collection"]
            }),
        },
        ToolDescriptor {
            name: "get_field_schema_reference",
            description: "Reference of the field types and options accepted in collection schemas",
            input_schema: json!({ "type": "object", "properties": {}, "required": [] }),
        },
        ToolDescriptor {
            name: "create_collection",
            description: "Create a new collection",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Unique collection name" },
                    "type": {
                        "type": "string",
                        "description": "Collection type",
                        "enum": ["base", "auth", "view"]
                    },
                    "fields": {
                        "type": "array",
                        "description": "Field definitions, see get_field_schema_reference"
                    },
                    "indexes": { "type": "array", "description": "Raw CREATE INDEX statements" },
                    "listRule": rule("listing records"),
                    "viewRule": rule("viewing a record"),
                    "createRule": rule("creating records"),
                    "updateRule": rule("updating records"),
                    "deleteRule": rule("deleting records"),
                    "viewQuery": {
                        "type": "string",
                        "description": "SELECT statement backing a view collection"
                    }
                },
                "required": ["name"]
            }),
        },
        ToolDescriptor {
            name: "update_collection",
            description: "Update an existing collection",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "collection": collection,
                    "data": { "type": "object", "description": "Collection properties to change" }
                },
                "required": ["collection", "data"]
            }),
        },
        ToolDescriptor {
            name: "delete_collection",
            description: "Delete a collection and all of its records",
            input_schema: json!({
                "type": "object",
                "properties": { "collection": collection },
                "required": ["collection"]
            }),
        },
        ToolDescriptor {
            name: "list_records",
            description: "List records of a collection",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "collection": collection,
                    "page": page,
                    "perPage": per_page,
                    "sort": sort,
                    "filter": filter,
                    "expand": expand,
                    "fields": fields
                },
                "required": ["collection"]
            }),
        },
        ToolDescriptor {
            name: "view_record",
            description: "View a single record",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "collection": collection,
                    "id": record_id,
                    "expand": expand,
                    "fields": fields
                },
                "required": ["collection", "id"]
            }),
        },
        ToolDescriptor {
            name: "create_record",
            description: "Create a record in a collection",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "collection": collection,
                    "data": { "type": "object", "description": "Record field values" },
                    "expand": expand,
                    "fields": fields
                },
                "required": ["collection", "data"]
            }),
        },
        ToolDescriptor {
            name: "update_record",
            description: "Update a record",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "collection": collection,
                    "id": record_id,
                    "data": { "type": "object", "description": "Record field values to change" },
                    "expand": expand,
                    "fields": fields
                },
                "required": ["collection", "id", "data"]
            }),
        },
        ToolDescriptor {
            name: "delete_record",
            description: "Delete a record",
            input_schema: json!({
                "type": "object",
                "properties": { "collection": collection, "id": record_id },
                "required": ["collection", "id"]
            }),
        },
    ]
}

/// Field types PocketBase accepts in a collection's `fields` array.
pub fn field_schema_reference() -> Value {
    json!({
        "commonOptions": {
            "name": "string, unique within the collection",
            "type": "one of the field types below",
            "required": "bool, reject empty values",
            "hidden": "bool, omit from API responses",
            "presentable": "bool, used as label in relation pickers",
            "system": "bool, field cannot be renamed or deleted"
        },
        "fieldTypes": {
            "text": {
                "min": "number",
                "max": "number",
                "pattern": "regex string",
                "autogeneratePattern": "regex string",
                "primaryKey": "bool"
            },
            "editor": { "maxSize": "bytes", "convertURLs": "bool" },
            "number": { "min": "number", "max": "number", "onlyInt": "bool" },
            "bool": {},
            "email": { "exceptDomains": "string[]", "onlyDomains": "string[]" },
            "url": { "exceptDomains": "string[]", "onlyDomains": "string[]" },
            "date": { "min": "datetime string", "max": "datetime string" },
            "autodate": { "onCreate": "bool", "onUpdate": "bool" },
            "select": { "values": "string[]", "maxSelect": "number (1 = single)" },
            "file": {
                "maxSelect": "number",
                "maxSize": "bytes",
                "mimeTypes": "string[]",
                "thumbs": "string[] e.g. 100x100",
                "protected": "bool"
            },
            "relation": {
                "collectionId": "string",
                "cascadeDelete": "bool",
                "minSelect": "number",
                "maxSelect": "number"
            },
            "json": { "maxSize": "bytes" },
            "password": {
                "min": "number",
                "max": "number",
                "pattern": "regex string",
                "cost": "bcrypt cost"
            },
            "geoPoint": {}
        },
        "example": [
            { "name": "title", "type": "text", "required": true, "max": 200 },
            {
                "name": "status",
                "type": "select",
                "values": ["draft", "published"],
                "maxSelect": 1
            },
            {
                "name": "author",
                "type": "relation",
                "collectionId": "_pb_users_auth_",
                "maxSelect": 1
            }
        ]
    })
}

fn collection_body(args: &JsonObject) -> Value {
    let mut body: JsonObject = COLLECTION_BODY_KEYS
        .iter()
        .filter_map(|k| args.get(*k).map(|v| (k.to_string(), v.clone())))
        .collect();
    body.entry("type").or_insert_with(|| json!("base"));
    Value::Object(body)
}

/// PocketBase variant: tool table plus an authenticated client.
pub struct PocketBaseTools {
    client: PocketBaseClient,
}

impl PocketBaseTools {
    pub fn new(client: PocketBaseClient) -> Self {
        Self { client }
    }

    async fn view_collection(&self, collection: &str) -> Result<Value, ToolError> {
        self.client.get(&["api", "collections", collection], &[]).await
    }
}

#[async_trait]
impl McpBackend for PocketBaseTools {
    fn server_info(&self) -> ServerInfo {
        ServerInfo { name: SERVER_NAME.into(), version: env!("CARGO_PKG_VERSION").into() }
    }

    fn registry(&self) -> &'static ToolRegistry {
        &REGISTRY
    }

    async fn call_tool(&self, name: &str, args: &JsonObject) -> Result<Value, ToolError> {
        let pb = &self.client;
        match name {
            "health" => pb.get(&["api", "health"], &[]).await,
            "list_collections" => {
                pb.get(&["api", "collections"], &forward_query(args, &LIST_COLLECTION_KEYS)).await
            }
            "view_collection" => self.view_collection(str_arg(args, "collection")?).await,
            "get_field_schema_reference" => Ok(field_schema_reference()),
            "create_collection" => {
                str_arg(args, "name")?;
                pb.post(&["api", "collections"], &[], &collection_body(args)).await
            }
            "update_collection" => {
                let collection = str_arg(args, "collection")?;
                let data = Value::Object(object_arg(args, "data")?.clone());
                pb.patch(&["api", "collections", collection], &[], &data).await
            }
            "delete_collection" => {
                pb.delete(&["api", "collections", str_arg(args, "collection")?]).await
            }
            "list_records" => {
                let collection = str_arg(args, "collection")?;
                let query = forward_query(args, &LIST_RECORD_KEYS);
                pb.get(&["api", "collections", collection, "records"], &query).await
            }
            "view_record" => {
                let collection = str_arg(args, "collection")?;
                let id = str_arg(args, "id")?;
                pb.get(
                    &["api", "collections", collection, "records", id],
                    &forward_query(args, &RECORD_VIEW_KEYS),
                )
                .await
            }
            "create_record" => {
                let collection = str_arg(args, "collection")?;
                let data = Value::Object(object_arg(args, "data")?.clone());
                pb.post(
                    &["api", "collections", collection, "records"],
                    &forward_query(args, &RECORD_VIEW_KEYS),
                    &data,
                )
                .await
            }
            "update_record" => {
                let collection = str_arg(args, "collection")?;
                let id = str_arg(args, "id")?;
                let data = Value::Object(object_arg(args, "data")?.clone());
                pb.patch(
                    &["api", "collections", collection, "records", id],
                    &forward_query(args, &RECORD_VIEW_KEYS),
                    &data,
                )
                .await
            }
            "delete_record" => {
                let collection = str_arg(args, "collection")?;
                let id = str_arg(args, "id")?;
                pb.delete(&["api", "collections", collection, "records", id]).await
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    async fn list_resources(&self) -> Result<Vec<Resource>, ToolError> {
        let per_page = vec![("perPage".to_string(), "500".to_string())];
        let listing = self.client.get(&["api", "collections"], &per_page).await?;
        Ok(collections_to_resources(&listing))
    }

    async fn read_resource(&self, uri: &str) -> Result<Value, ToolError> {
        let collection = parse_collection_uri(uri)?;
        self.view_collection(collection).await
    }
}
