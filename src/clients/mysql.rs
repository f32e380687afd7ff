use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::mysql::types::MySqlTime;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, Connection, Executor, MySql, Row, TypeInfo, ValueRef};
use tokio::sync::Mutex;

use crate::core::error::ToolError;
use crate::domain::MySqlParams;

pub type SqlRow = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecOutcome {
    pub affected_rows: u64,
    pub last_insert_id: u64,
}

/// A live database handle owned by one inbound request.
#[async_trait]
pub trait SqlBackend: Send + Sync {
    async fn fetch_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<SqlRow>, ToolError>;
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecOutcome, ToolError>;
}

/// Opens a fresh [`SqlBackend`] for each request.
#[async_trait]
pub trait SqlConnector: Send + Sync {
    async fn connect(&self, params: &MySqlParams) -> Result<Box<dyn SqlBackend>, ToolError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MySqlConnector;

#[async_trait]
impl SqlConnector for MySqlConnector {
    async fn connect(&self, params: &MySqlParams) -> Result<Box<dyn SqlBackend>, ToolError> {
        let opts = MySqlConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .username(&params.user)
            .password(&params.pass)
            .database(&params.dbname);
        let conn = MySqlConnection::connect_with(&opts)
            .await
            .map_err(|e| ToolError::Connection(e.to_string()))?;
        tracing::debug!(
            host = %params.host,
            port = params.port,
            db = %params.dbname,
            "mysql connected"
        );
        Ok(Box::new(MySqlBackend { conn: Mutex::new(conn) }))
    }
}

pub struct MySqlBackend {
    conn: Mutex<MySqlConnection>,
}

#[async_trait]
impl SqlBackend for MySqlBackend {
    async fn fetch_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<SqlRow>, ToolError> {
        let mut conn = self.conn.lock().await;
        // Without parameters the text protocol is used, which also covers SHOW/DESCRIBE.
        if params.is_empty() {
            let rows = (&mut *conn).fetch_all(sql).await?;
            rows.iter().map(|r| row_to_json(r, Protocol::Text)).collect()
        } else {
            let rows = bind_all(sqlx::query(sql), params).fetch_all(&mut *conn).await?;
            rows.iter().map(|r| row_to_json(r, Protocol::Binary)).collect()
        }
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecOutcome, ToolError> {
        let mut conn = self.conn.lock().await;
        let done = if params.is_empty() {
            (&mut *conn).execute(sql).await?
        } else {
            bind_all(sqlx::query(sql), params).execute(&mut *conn).await?
        };
        Ok(ExecOutcome {
            affected_rows: done.rows_affected(),
            last_insert_id: done.last_insert_id(),
        })
    }
}

fn bind_all<'q>(
    mut q: Query<'q, MySql, MySqlArguments>,
    params: &'q [Value],
) -> Query<'q, MySql, MySqlArguments> {
    for p in params {
        q = match p {
            Value::Null => q.bind(None::<String>),
            Value::Bool(b) => q.bind(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    q.bind(i)
                } else if let Some(u) = n.as_u64() {
                    q.bind(u)
                } else {
                    q.bind(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => q.bind(s.as_str()),
            other => q.bind(other.to_string()),
        };
    }
    q
}

/// Wire format of a result set: plain queries come back as text, prepared ones as binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Protocol {
    Text,
    Binary,
}

fn row_to_json(row: &MySqlRow, protocol: Protocol) -> Result<SqlRow, ToolError> {
    let mut out = Map::new();
    for col in row.columns() {
        let idx = col.ordinal();
        let raw = row.try_get_raw(idx)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let ty = raw.type_info().name().to_ascii_uppercase();
            match protocol {
                Protocol::Text => text_cell(&ty, &row.try_get_unchecked::<Vec<u8>, _>(idx)?),
                Protocol::Binary => binary_cell(row, idx, &ty)?,
            }
        };
        out.insert(col.name().to_string(), value);
    }
    Ok(out)
}

/// Map one text-protocol cell to JSON. Temporal and DECIMAL values keep the
/// server's own rendering (fractions, negative or 24h+ TIME, zero dates).
fn text_cell(ty: &str, raw: &[u8]) -> Value {
    let text = String::from_utf8_lossy(raw);
    let parsed = match ty {
        t if t == "BOOLEAN" || is_integer(t) => text
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| text.parse::<u64>().map(Value::from))
            .ok(),
        "YEAR" => text.parse::<u16>().ok().map(Value::from),
        "FLOAT" | "DOUBLE" => text
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        "JSON" => serde_json::from_str(&text).ok(),
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::String(text.into_owned()))
}

fn fmt_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn fmt_datetime(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}

/// Binary-protocol rendering of an all-zero DATE/DATETIME/TIMESTAMP, which chrono cannot hold.
fn zero_temporal(ty: &str) -> &'static str {
    if ty == "DATE" {
        "0000-00-00"
    } else {
        "0000-00-00 00:00:00"
    }
}

fn binary_cell(row: &MySqlRow, idx: usize, ty: &str) -> Result<Value, ToolError> {
    let v = match ty {
        t if is_integer(t) && t.contains("UNSIGNED") => {
            Value::from(row.try_get_unchecked::<u64, _>(idx)?)
        }
        t if t == "BOOLEAN" || is_integer(t) => Value::from(row.try_get_unchecked::<i64, _>(idx)?),
        "FLOAT" => Value::from(f64::from(row.try_get::<f32, _>(idx)?)),
        "DOUBLE" => Value::from(row.try_get::<f64, _>(idx)?),
        "YEAR" => Value::from(row.try_get_unchecked::<u16, _>(idx)?),
        "TIME" => Value::String(row.try_get::<MySqlTime, _>(idx)?.to_string()),
        "DATE" => match row.try_get::<NaiveDate, _>(idx) {
            Ok(d) => Value::String(fmt_date(d)),
            Err(_) => Value::String(zero_temporal(ty).to_string()),
        },
        "DATETIME" | "TIMESTAMP" => match row.try_get::<NaiveDateTime, _>(idx) {
            Ok(dt) => Value::String(fmt_datetime(dt)),
            Err(_) => Value::String(zero_temporal(ty).to_string()),
        },
        "JSON" => {
            let text = row.try_get_unchecked::<String, _>(idx)?;
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        }
        // DECIMAL, text, enum/set and binary columns: strings, lossy for non-UTF-8 bytes.
        _ => match row.try_get_unchecked::<String, _>(idx) {
            Ok(s) => Value::String(s),
            Err(_) => {
                let bytes = row.try_get_unchecked::<Vec<u8>, _>(idx)?;
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            }
        },
    };
    Ok(v)
}

fn is_integer(ty: &str) -> bool {
    ["TINYINT", "SMALLINT", "MEDIUMINT", "INT", "BIGINT"]
        .iter()
        .any(|base| ty == *base || ty.starts_with(&format!("{base} ")))
}
