//! Tool registry

use crate::Tool;
use analyst_core::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Fixed set of tools, keyed by name
///
/// Built once through [`ToolRegistryBuilder`] and shared behind an `Arc`;
/// there is no mutation after construction, so lookups need no locking.
/// Iteration order is by name, which keeps tool lists sent to the model
/// stable between calls.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.tools.keys()).finish()
    }
}

impl ToolRegistry {
    /// Start building a registry
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// All tools, ordered by name
    pub fn tools(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.values()
    }

    /// Registered tool names, ordered
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Run a tool by name
    ///
    /// An unknown name is an [`Error::ToolFailed`]; errors raised by the
    /// tool itself come back unchanged so their failure kind survives.
    pub async fn execute(&self, name: &str, params: Value) -> Result<Value> {
        let tool = self.get(name).ok_or_else(|| Error::ToolFailed {
            name: name.to_string(),
            message: format!("unknown tool; available: {}", self.names().join(", ")),
        })?;

        debug!(tool = name, "executing tool");
        tool.execute(params).await
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Builder for [`ToolRegistry`]
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistryBuilder {
    /// Add a tool
    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    /// Add a tool, failing if the name is taken
    pub fn try_tool(mut self, tool: Arc<dyn Tool>) -> Result<Self> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(Error::InitializationFailed(format!(
                "tool '{name}' registered twice"
            )));
        }
        self.tools.insert(name, tool);
        Ok(self)
    }

    /// Finish building
    pub fn build(self) -> ToolRegistry {
        ToolRegistry { tools: self.tools }
    }
}
