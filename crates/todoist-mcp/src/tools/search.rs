//! Task search tool.

use serde_json::json;

use super::{McpTool, ToolContext};
use crate::error::ToolResult;
use crate::models::{SearchHit, SearchInput};

/// Substring search over task content.
pub struct SearchTool;

impl SearchTool {
    /// Tasks whose content contains `query`, ignoring case.
    pub async fn search(ctx: &ToolContext, query: &str) -> ToolResult<Vec<SearchHit>> {
        let needle = query.to_lowercase();
        let tasks = ctx.client.list_tasks().await?;

        let hits = tasks
            .into_iter()
            .filter(|t| t.matches(&needle))
            .map(|t| SearchHit {
                url: ctx.client.task_url(&t.id),
                text: t.text().to_string(),
                title: t.content,
                id: t.id,
            })
            .collect::<Vec<_>>();

        tracing::debug!(query = %query, hits = hits.len(), "Task search complete");
        Ok(hits)
    }
}

#[async_trait::async_trait]
impl McpTool for SearchTool {
    fn name(&self) -> &'static str {
        "search"
    }

    fn description(&self) -> &'static str {
        "Search Todoist tasks whose content contains the given text (case-insensitive)."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Text to look for in task content"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<serde_json::Value> {
        let params = SearchInput::from_args(&input);
        let query = params.require_query()?;
        let hits = Self::search(ctx, query).await?;
        Ok(serde_json::to_value(hits)?)
    }
}
