//! Field validators. Pure functions: they look at values and never touch a store.

use chrono::{DateTime, Utc};

use crate::{task_status::TaskStatus, ValidationError};

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}

pub fn validate_due_date(
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
) -> Result<(), ValidationError> {
    match due_date {
        Some(due) if due < created_at => Err(ValidationError::DueDateBeforeCreation),
        _ => Ok(()),
    }
}

pub fn validate_transition(from: TaskStatus, to: TaskStatus) -> Result<(), ValidationError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(ValidationError::InvalidTransition { from, to })
    }
}

/// Loose shape check: a non-empty local part and domain around a single `@`.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LEN });
    }
    Ok(())
}
