use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{task::Task, DomainResult};

/// Storage-level failures shared by every backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    #[error("record already exists")]
    Duplicate,

    #[error("storage: {0}")]
    Storage(String),

    #[error("encode: {0}")]
    Encode(String),

    #[error("decode: {0}")]
    Decode(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Read-modify-write step for [`TaskRepository::update_with`], run while the store holds the
/// task exclusively. `Ok(true)` writes the changed copy back, `Ok(false)` leaves the store as
/// it was, `Err` aborts without writing.
pub type TaskMutation = Box<dyn FnOnce(&mut Task) -> DomainResult<bool> + Send>;

/// Task persistence contract. The in-memory store and the redb file both satisfy it.
///
/// Access control is not the repository's business: `get_all` hands back every task and
/// the caller decides who may see them.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a new task. Fails with [`RepositoryError::Duplicate`] if the id is taken.
    async fn create(&self, task: &Task) -> RepositoryResult<()>;

    /// Replace a stored task. Fails with [`RepositoryError::NotFound`] if the id is unknown.
    async fn update(&self, task: &Task) -> RepositoryResult<()>;

    /// Load, mutate and store one task as a single atomic step, so concurrent updates can't
    /// interleave between the read and the write. The outer result is the store's, the inner
    /// one is whatever `mutate` decided.
    async fn update_with(&self, id: Uuid, mutate: TaskMutation) -> RepositoryResult<DomainResult<Task>>;

    /// Remove a task. Fails with [`RepositoryError::NotFound`] if the id is unknown.
    async fn delete(&self, id: Uuid) -> RepositoryResult<()>;

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Task>;

    async fn get_by_owner(&self, owner: Uuid) -> RepositoryResult<Vec<Task>>;

    async fn get_all(&self) -> RepositoryResult<Vec<Task>>;

    /// Remove every task owned by `owner`, returning how many went.
    async fn delete_by_owner(&self, owner: Uuid) -> RepositoryResult<usize>;

    /// Remove every task, returning how many went.
    async fn clear(&self) -> RepositoryResult<usize>;
}
