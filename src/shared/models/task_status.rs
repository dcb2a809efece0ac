use serde::{Deserialize, Serialize};

/// Task status lifecycle: Pending → InProgress → Completed, or Pending → Completed.
///
/// Completed is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    #[serde(alias = "inprogress")]
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Whether a task may move from `self` to `next`. Writing the current status again is allowed.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Pending)
                | (InProgress, InProgress)
                | (Completed, Completed)
                | (Pending, InProgress)
                | (Pending, Completed)
                | (InProgress, Completed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
