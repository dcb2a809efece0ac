use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{task_priority::TaskPriority, task_status::TaskStatus};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    // Missing title deserializes as empty so validation reports it, not the extractor.
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
}
