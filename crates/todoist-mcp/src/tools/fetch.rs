//! Task fetch tool.

use serde_json::json;

use super::{McpTool, ToolContext};
use crate::error::ToolResult;
use crate::models::{FetchInput, TaskDocument, TaskId, TaskMetadata};

/// Fetch one task by ID.
pub struct FetchTool;

impl FetchTool {
    pub async fn fetch(ctx: &ToolContext, id: &TaskId) -> ToolResult<TaskDocument> {
        let task = ctx.client.get_task(id).await?;

        Ok(TaskDocument {
            url: ctx.client.task_url(&task.id),
            text: task.text().to_string(),
            title: task.content,
            metadata: TaskMetadata { project_id: task.project_id, due: task.due },
            id: task.id,
        })
    }
}

#[async_trait::async_trait]
impl McpTool for FetchTool {
    fn name(&self) -> &'static str {
        "fetch"
    }

    fn description(&self) -> &'static str {
        "Fetch a single Todoist task by ID, including its project and due date."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "ID of the task to fetch"
                }
            },
            "required": ["id"]
        })
    }

    fn upstream_error_message(&self) -> &'static str {
        "Todoist API error"
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<serde_json::Value> {
        let params = FetchInput::from_args(&input);
        let id = params.require_id()?;
        let document = Self::fetch(ctx, id).await?;
        Ok(serde_json::to_value(document)?)
    }
}
