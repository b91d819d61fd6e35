//! Todoist task models and the shapes handed back to MCP clients.

use serde::{Deserialize, Deserializer, Serialize};

/// Task identifier, always carried as a string.
///
/// The REST API has used both numeric and string ids, so both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Number(n) => Self(n.to_string()),
        })
    }
}

/// A task as returned by the Todoist REST API.
///
/// Only the fields the gateway reads are modelled.
#[derive(Debug, Clone, Deserialize)]
pub struct Task {
    /// Empty when the API omitted it.
    #[serde(default)]
    pub id: TaskId,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub project_id: Option<serde_json::Value>,

    #[serde(default)]
    pub due: Option<serde_json::Value>,
}

impl Task {
    /// Case-insensitive substring match on the task content.
    #[must_use]
    pub fn matches(&self, needle_lower: &str) -> bool {
        self.content.to_lowercase().contains(needle_lower)
    }

    /// Description, or empty when the task has none.
    #[must_use]
    pub fn text(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }
}

/// One `search` hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub id: TaskId,
    pub title: String,
    pub text: String,
    pub url: String,
}

/// Project and due-date details attached to a fetched task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskMetadata {
    pub project_id: Option<serde_json::Value>,
    pub due: Option<serde_json::Value>,
}

/// A fully fetched task document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskDocument {
    pub id: TaskId,
    pub title: String,
    pub text: String,
    pub url: String,
    pub metadata: TaskMetadata,
}
