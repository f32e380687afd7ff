use serde_json::{json, Value};

use crate::core::error::ToolError;
use crate::core::tool::ToolDescriptor;

/// Ordered, immutable tool table of one variant.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self { tools }
    }

    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Resolve a tool by name and check its required arguments are present.
    pub fn resolve(
        &self,
        name: &str,
        args: &serde_json::Map<String, Value>,
    ) -> Result<&ToolDescriptor, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.check_required(args)?;
        Ok(tool)
    }

    /// `tools/list` payload.
    pub fn list(&self) -> Value {
        json!({ "tools": self.tools })
    }
}
