use async_trait::async_trait;
use uuid::Uuid;

use crate::{data_access::task_repository::RepositoryResult, user::User};

/// User persistence contract. Emails are unique, compared in their stored (lowercased) form.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Duplicate` if either the id or the email is already registered.
    async fn create(&self, user: &User) -> RepositoryResult<()>;

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<User>;

    async fn get_by_email(&self, email: &str) -> RepositoryResult<User>;

    /// Replace a stored user, keeping the email index in step. `Duplicate` if the new
    /// email belongs to someone else.
    async fn update(&self, user: &User) -> RepositoryResult<()>;

    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;

    async fn count(&self) -> RepositoryResult<usize>;
}
