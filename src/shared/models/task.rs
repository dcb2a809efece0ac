use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{task_priority::TaskPriority, task_response::TaskResponse, task_status::TaskStatus};

/// A task record as stored by the repositories.
///
/// `id` and `owner` are fixed at creation. `updated_at` never precedes `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Option<TaskPriority>,
    pub owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    /// Refresh `updated_at`, clamped so it can't fall behind `created_at` on clock skew.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }

    pub fn to_response(&self) -> TaskResponse {
        TaskResponse {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            priority: self.priority,
            owner: self.owner,
            created_at: self.created_at,
            updated_at: self.updated_at,
            due_date: self.due_date,
        }
    }
}
