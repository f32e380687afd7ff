use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};

use crate::clients::mysql::SqlBackend;
use crate::core::error::ToolError;
use crate::core::mcp::ServerInfo;
use crate::core::tool::{str_arg, JsonObject, McpBackend, ToolDescriptor};
use crate::domain::Resource;
use crate::resources::{parse_table_uri, tables_to_resources};
use crate::tools::registry::ToolRegistry;

pub const SERVER_NAME: &str = "mysql-mcp";

// Prefix gates, not parsers: multi-statement text and `SELECT ... INTO OUTFILE` still pass.
static SELECT_GATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*SELECT").expect("select gate"));
static WRITE_GATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(INSERT|UPDATE|DELETE)").expect("write gate"));

pub static REGISTRY: LazyLock<ToolRegistry> = LazyLock::new(|| ToolRegistry::new(descriptors()));

fn descriptors() -> Vec<ToolDescriptor> {
    let params = json!({
        "type": "array",
        "description": "Positional values bound to ? placeholders",
        "items": {}
    });
    vec![
        ToolDescriptor {
            name: "query",
            description: "Run a SELECT query and return the rows",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "sql": { "type": "string", "description": "SELECT statement" },
                    "params": params
                },
                "required": ["sql"]
            }),
        },
        ToolDescriptor {
            name: "execute",
            description: "Run an INSERT, UPDATE or DELETE statement",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "sql": {
                        "type": "string",
                        "description": "INSERT, UPDATE or DELETE statement"
                    },
                    "params": params
                },
                "required": ["sql"]
            }),
        },
        ToolDescriptor {
            name: "list_tables",
            description: "List the tables of the current database",
            input_schema: json!({ "type": "object", "properties": {}, "required": [] }),
        },
        ToolDescriptor {
            name: "describe_table",
            description: "Describe the columns of a table",
            input_schema: json!({
                "type": "object",
                "properties": { "table": { "type": "string", "description": "Table name" } },
                "required": ["table"]
            }),
        },
    ]
}

pub fn ensure_select(sql: &str) -> Result<(), ToolError> {
    if SELECT_GATE.is_match(sql) {
        Ok(())
    } else {
        Err(ToolError::Validation("Only SELECT queries are allowed".into()))
    }
}

pub fn ensure_write(sql: &str) -> Result<(), ToolError> {
    if WRITE_GATE.is_match(sql) {
        Ok(())
    } else {
        Err(ToolError::Validation("Only INSERT, UPDATE, DELETE statements are allowed".into()))
    }
}

/// Keep `[a-zA-Z0-9_]` only; identifiers cannot be bound as parameters.
pub fn sanitize_table_name(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_').collect()
}

fn params_arg(args: &JsonObject) -> Result<&[Value], ToolError> {
    match args.get("params") {
        None | Some(Value::Null) => Ok(&[][..]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(ToolError::Validation("Parameter 'params' must be an array".into())),
    }
}

/// MySQL variant: tool table plus the request's database handle.
pub struct MySqlTools {
    db: Box<dyn SqlBackend>,
}

impl MySqlTools {
    pub fn new(db: Box<dyn SqlBackend>) -> Self {
        Self { db }
    }

    async fn list_tables(&self) -> Result<Vec<String>, ToolError> {
        let rows = self.db.fetch_rows("SHOW TABLES", &[]).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match row.into_iter().next() {
                Some((_, Value::String(name))) => Some(name),
                Some((_, other)) if !other.is_null() => Some(other.to_string()),
                _ => None,
            })
            .collect())
    }

    async fn describe_table(&self, raw: &str) -> Result<Value, ToolError> {
        let table = sanitize_table_name(raw);
        if table.is_empty() {
            return Err(ToolError::Validation(format!("Invalid table name: '{raw}'")));
        }
        let rows = self.db.fetch_rows(&format!("DESCRIBE `{table}`"), &[]).await?;
        Ok(Value::Array(rows.into_iter().map(Value::Object).collect()))
    }
}

#[async_trait]
impl McpBackend for MySqlTools {
    fn server_info(&self) -> ServerInfo {
        ServerInfo { name: SERVER_NAME.into(), version: env!("CARGO_PKG_VERSION").into() }
    }

    fn registry(&self) -> &'static ToolRegistry {
        &REGISTRY
    }

    async fn call_tool(&self, name: &str, args: &JsonObject) -> Result<Value, ToolError> {
        match name {
            "query" => {
                let sql = str_arg(args, "sql")?;
                ensure_select(sql)?;
                let rows = self.db.fetch_rows(sql, params_arg(args)?).await?;
                Ok(Value::Array(rows.into_iter().map(Value::Object).collect()))
            }
            "execute" => {
                let sql = str_arg(args, "sql")?;
                ensure_write(sql)?;
                let outcome = self.db.execute(sql, params_arg(args)?).await?;
                serde_json::to_value(outcome).map_err(|e| ToolError::Backend(e.to_string()))
            }
            "list_tables" => Ok(Value::from(self.list_tables().await?)),
            "describe_table" => self.describe_table(str_arg(args, "table")?).await,
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    async fn list_resources(&self) -> Result<Vec<Resource>, ToolError> {
        Ok(tables_to_resources(&self.list_tables().await?))
    }

    async fn read_resource(&self, uri: &str) -> Result<Value, ToolError> {
        let table = parse_table_uri(uri)?;
        self.describe_table(table).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::mysql::{ExecOutcome, SqlRow};
    use std::sync::{Arc, Mutex};

    /// Records every statement and answers with canned rows.
    #[derive(Default, Clone)]
    struct FakeDb {
        seen: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
    }

    #[async_trait]
    impl SqlBackend for FakeDb {
        async fn fetch_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<SqlRow>, ToolError> {
            self.seen.lock().unwrap().push((sql.to_string(), params.to_vec()));
            let row = |v: Value| v.as_object().cloned().unwrap();
            Ok(match sql {
                "SHOW TABLES" => vec![
                    row(json!({"Tables_in_shop": "orders"})),
                    row(json!({"Tables_in_shop": "users"})),
                ],
                s if s.starts_with("DESCRIBE") => {
                    vec![row(json!({"Field": "id", "Type": "int", "Null": "NO", "Key": "PRI"}))]
                }
                _ => vec![row(json!({"id": 1, "name": "ada"}))],
            })
        }

        async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecOutcome, ToolError> {
            self.seen.lock().unwrap().push((sql.to_string(), params.to_vec()));
            Ok(ExecOutcome { affected_rows: 1, last_insert_id: 7 })
        }
    }

    fn tools() -> (MySqlTools, FakeDb) {
        let db = FakeDb::default();
        (MySqlTools::new(Box::new(db.clone())), db)
    }

    fn args(v: Value) -> JsonObject {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn select_gate_is_a_case_insensitive_prefix_check() {
        assert!(ensure_select("SELECT * FROM users").is_ok());
        assert!(ensure_select("  \n select 1").is_ok());
        assert!(ensure_select("DROP TABLE users").is_err());
        assert!(ensure_select("WITH x AS (SELECT 1) SELECT * FROM x").is_err());
        // Known limitation: the gate does not parse the statement.
        assert!(ensure_select("SELECT 1; DROP TABLE users").is_ok());
    }

    #[test]
    fn write_gate_accepts_dml_only() {
        assert!(ensure_write("insert into t values (1)").is_ok());
        assert!(ensure_write(" UPDATE t SET a = 1").is_ok());
        assert!(ensure_write("Delete from t").is_ok());
        assert!(ensure_write("SELECT 1").is_err());
        assert!(ensure_write("TRUNCATE t").is_err());
    }

    #[test]
    fn table_names_are_stripped_to_identifier_chars() {
        assert_eq!(sanitize_table_name("users; DROP TABLE x"), "usersDROPTABLEx");
        assert_eq!(sanitize_table_name("`order_items`"), "order_items");
        assert_eq!(sanitize_table_name("../.."), "");
    }

    #[tokio::test]
    async fn query_rejects_non_select_before_touching_db() {
        let (t, db) = tools();
        let err =
            t.call_tool("query", &args(json!({"sql": "DROP TABLE users"}))).await.unwrap_err();
        assert_eq!(err.to_string(), "Only SELECT queries are allowed");
        assert!(db.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn query_forwards_sql_and_params() {
        let (t, db) = tools();
        let out = t
            .call_tool(
                "query",
                &args(json!({"sql": "SELECT * FROM users WHERE id = ?", "params": [1]})),
            )
            .await
            .unwrap();
        assert_eq!(out[0]["name"], "ada");
        let seen = db.seen.lock().unwrap();
        assert_eq!(seen[0].0, "SELECT * FROM users WHERE id = ?");
        assert_eq!(seen[0].1, vec![json!(1)]);
    }

    #[tokio::test]
    async fn execute_returns_outcome() {
        let (t, _db) = tools();
        let out = t
            .call_tool(
                "execute",
                &args(json!({"sql": "INSERT INTO users (name) VALUES (?)", "params": ["bob"]})),
            )
            .await
            .unwrap();
        assert_eq!(out, json!({"affected_rows": 1, "last_insert_id": 7}));
    }

    #[tokio::test]
    async fn params_must_be_an_array() {
        let (t, _db) = tools();
        let err = t
            .call_tool("query", &args(json!({"sql": "SELECT 1", "params": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
    }

    #[tokio::test]
    async fn list_tables_flattens_first_column() {
        let (t, _db) = tools();
        let out = t.call_tool("list_tables", &JsonObject::new()).await.unwrap();
        assert_eq!(out, json!(["orders", "users"]));
    }

    #[tokio::test]
    async fn describe_table_uses_sanitized_identifier() {
        let (t, db) = tools();
        t.call_tool("describe_table", &args(json!({"table": "users; DROP TABLE x"})))
            .await
            .unwrap();
        assert_eq!(db.seen.lock().unwrap()[0].0, "DESCRIBE `usersDROPTABLEx`");
    }

    #[tokio::test]
    async fn describe_table_rejects_names_that_sanitize_to_nothing() {
        let (t, db) = tools();
        let err = t.call_tool("describe_table", &args(json!({"table": "`;--"}))).await.unwrap_err();
        assert!(matches!(err, ToolError::Validation(_)));
        assert!(db.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn resources_round_trip_through_table_uris() {
        let (t, _db) = tools();
        let res = t.list_resources().await.unwrap();
        assert_eq!(res[1].uri, "mysql://table/users");
        let read = t.read_resource(&res[1].uri).await.unwrap();
        let described =
            t.call_tool("describe_table", &args(json!({"table": "users"}))).await.unwrap();
        assert_eq!(read, described);
        let foreign = t.read_resource("pocketbase://collection/users").await;
        assert!(matches!(foreign, Err(ToolError::InvalidResourceUri(_))));
    }
}
