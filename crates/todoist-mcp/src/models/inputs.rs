//! Tool input models.
//!
//! Arguments are parsed leniently: a missing, null, or empty value is reported
//! as a missing parameter rather than a deserialization failure.

use serde::Deserialize;

use super::TaskId;
use crate::error::{ToolError, ToolResult};

/// Input for the `search` tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchInput {
    #[serde(default)]
    pub query: Option<String>,
}

impl SearchInput {
    /// Parse tool arguments; anything that is not an object counts as empty.
    #[must_use]
    pub fn from_args(args: &serde_json::Value) -> Self {
        serde_json::from_value(args.clone()).unwrap_or_default()
    }

    /// The non-empty query.
    pub fn require_query(&self) -> ToolResult<&str> {
        self.query.as_deref().filter(|q| !q.is_empty()).ok_or(ToolError::missing("query"))
    }
}

/// Input for the `fetch` tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchInput {
    #[serde(default)]
    pub id: Option<TaskId>,
}

impl FetchInput {
    /// Parse tool arguments; anything that is not an object counts as empty.
    #[must_use]
    pub fn from_args(args: &serde_json::Value) -> Self {
        serde_json::from_value(args.clone()).unwrap_or_default()
    }

    /// The non-empty task id.
    pub fn require_id(&self) -> ToolResult<&TaskId> {
        self.id.as_ref().filter(|id| !id.is_empty()).ok_or(ToolError::missing("id"))
    }
}
