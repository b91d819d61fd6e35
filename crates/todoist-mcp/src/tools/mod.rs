//! MCP tool implementations.
//!
//! Each tool:
//! 1. Parses and validates its arguments
//! 2. Calls the Todoist API client
//! 3. Shapes the result into the JSON returned to the agent

mod fetch;
mod search;

pub use fetch::FetchTool;
pub use search::SearchTool;

use std::sync::Arc;

use serde::Serialize;

use crate::client::TodoistClient;
use crate::error::ToolResult;

/// Tool execution context.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// API client.
    pub client: Arc<TodoistClient>,
}

impl ToolContext {
    /// Create a new tool context.
    #[must_use]
    pub fn new(client: Arc<TodoistClient>) -> Self {
        Self { client }
    }
}

/// Trait for MCP tools.
#[async_trait::async_trait]
pub trait McpTool: Send + Sync {
    /// Tool name (e.g., "search").
    fn name(&self) -> &'static str;

    /// Tool description for the agent.
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters.
    fn input_schema(&self) -> serde_json::Value;

    /// JSON-RPC error message used when the backend rejects the call.
    fn upstream_error_message(&self) -> &'static str {
        "Internal error"
    }

    /// Execute the tool with given arguments.
    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> ToolResult<serde_json::Value>;
}

/// Tool entry as advertised by `tools/list` and the SSE catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Static catalog of callable tools.
pub struct ToolRegistry {
    tools: Vec<Box<dyn McpTool>>,
}

impl ToolRegistry {
    /// Registry holding `search` and `fetch`.
    #[must_use]
    pub fn new() -> Self {
        Self { tools: register_all_tools() }
    }

    /// Look up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn McpTool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    /// Descriptors for every registered tool, in registration order.
    #[must_use]
    pub fn all(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|t| ToolDescriptor {
                name: t.name(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// The catalog as `{"tools": [...]}`.
    #[must_use]
    pub fn catalog(&self) -> serde_json::Value {
        serde_json::json!({ "tools": self.all() })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.tools.iter().map(|t| t.name())).finish()
    }
}

/// Register all tools.
#[must_use]
pub fn register_all_tools() -> Vec<Box<dyn McpTool>> {
    vec![Box::new(SearchTool), Box::new(FetchTool)]
}
