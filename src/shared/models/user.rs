use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{caller::Caller, role::Role, user_get_response::UserGetResponse};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a user from an already-hashed password. Emails are stored lowercased.
    pub fn new(email: &str, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(email),
            password_hash,
            role,
            created_at: Utc::now(),
        }
    }

    pub fn caller(&self) -> Caller {
        Caller::new(self.id, self.role)
    }

    pub fn to_get_dto(&self) -> UserGetResponse {
        UserGetResponse {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
