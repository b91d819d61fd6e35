//! Data models for Todoist tasks and tool inputs.

mod inputs;
mod task;

pub use inputs::{FetchInput, SearchInput};
pub use task::{SearchHit, Task, TaskDocument, TaskId, TaskMetadata};
