use thiserror::Error;

use crate::{data_access::task_repository::RepositoryError, task_status::TaskStatus};

/// Why a payload was rejected before reaching a repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("email is not valid")]
    InvalidEmail,

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("due date cannot precede the creation date")]
    DueDateBeforeCreation,

    #[error("status cannot change from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("{0}")]
    MalformedBody(String),
}

/// Every failure a usecase can report. The web layer picks the HTTP status from the variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid request payload: {0}")]
    InvalidPayload(#[from] ValidationError),

    #[error("task not found")]
    TaskNotFound,

    #[error("access denied")]
    AccessDenied,

    #[error("user not found")]
    UserNotFound,

    #[error("user already exists")]
    UserExists,

    #[error("invalid credentials")]
    Unauthenticated,

    #[error("internal server error: {0}")]
    InternalServer(String),

    #[error("operation timed out")]
    Timeout,
}

impl DomainError {
    /// Translate a task repository failure. Only "not found" carries domain meaning.
    pub fn from_task_repository(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => DomainError::TaskNotFound,
            other => DomainError::InternalServer(other.to_string()),
        }
    }

    /// Translate a user repository failure. A duplicate here is a registration clash.
    pub fn from_user_repository(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => DomainError::UserNotFound,
            RepositoryError::Duplicate => DomainError::UserExists,
            other => DomainError::InternalServer(other.to_string()),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_errors_translate_by_kind() {
        assert_eq!(DomainError::from_task_repository(RepositoryError::NotFound), DomainError::TaskNotFound);
        assert!(matches!(
            DomainError::from_task_repository(RepositoryError::Duplicate),
            DomainError::InternalServer(_)
        ));
        assert_eq!(DomainError::from_user_repository(RepositoryError::Duplicate), DomainError::UserExists);
        assert_eq!(DomainError::from_user_repository(RepositoryError::NotFound), DomainError::UserNotFound);
    }

    #[test]
    fn transition_message_names_both_states() {
        let e = DomainError::from(ValidationError::InvalidTransition {
            from: TaskStatus::Completed,
            to: TaskStatus::Pending,
        });
        assert_eq!(e.to_string(), "invalid request payload: status cannot change from completed to pending");
    }
}
