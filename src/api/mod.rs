pub mod dispatch;
pub mod docs;
pub mod mcp;
