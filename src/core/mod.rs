//! Core types & traits: protocol envelopes, content blocks, errors and the backend contract.

pub mod content;
pub mod error;
pub mod mcp;
pub mod tool;
