use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::{task_priority::TaskPriority, task_status::TaskStatus};

/// Partial update body.
///
/// A field left out of the JSON is left untouched on the task. For the clearable fields
/// (`description`, `priority`, `dueDate`) an explicit `null` clears the value, so the outer
/// `Option` means "present" and the inner one carries the new value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "present")]
    pub priority: Option<Option<TaskPriority>>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl UpdateTaskRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
