use thiserror::Error;

use crate::core::mcp::{INTERNAL_ERROR, INVALID_PARAMS, PARSE_ERROR};

/// Failure inside a single tool / resource invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid resource URI: {0}")]
    InvalidResourceUri(String),
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error("Missing required parameter: {0}")]
    MissingArgument(String),
    #[error("{0}")]
    Validation(String),
    /// Error reported by the backend itself (PocketBase `message`, HTTP status fallback).
    #[error("{0}")]
    Backend(String),
    #[error("HTTP request failed: {0}")]
    Transport(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Database connection failed: {0}")]
    Connection(String),
}

impl ToolError {
    pub fn rpc_code(&self) -> i32 {
        match self {
            ToolError::UnknownTool(_)
            | ToolError::InvalidResourceUri(_)
            | ToolError::InvalidParams(_) => INVALID_PARAMS,
            _ => INTERNAL_ERROR,
        }
    }
}

impl From<reqwest::Error> for ToolError {
    fn from(e: reqwest::Error) -> Self {
        ToolError::Transport(e.to_string())
    }
}

impl From<sqlx::Error> for ToolError {
    fn from(e: sqlx::Error) -> Self {
        ToolError::Database(e.to_string())
    }
}

/// Request-level failure detected before dispatch.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Missing required parameter: {0}")]
    MissingParam(&'static str),
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),
    #[error(transparent)]
    Tool(#[from] ToolError),
}

impl GatewayError {
    pub fn rpc_code(&self) -> i32 {
        match self {
            GatewayError::Parse(_) => PARSE_ERROR,
            GatewayError::MissingParam(_) | GatewayError::InvalidParam(_) => INVALID_PARAMS,
            GatewayError::Tool(e) => e.rpc_code(),
        }
    }
}
