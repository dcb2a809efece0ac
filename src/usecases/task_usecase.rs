use std::{future::Future, sync::Arc, time::Duration};

use chrono::Utc;
use uuid::Uuid;

use crate::{
    caller::Caller,
    create_task_request::CreateTaskRequest,
    data_access::{
        task_repository::{RepositoryError, RepositoryResult, TaskMutation, TaskRepository},
        user_repository::UserRepository,
    },
    settings::Timeouts,
    shared::validation::{validate_due_date, validate_title, validate_transition},
    task::Task,
    update_task_request::UpdateTaskRequest,
    DomainError, DomainResult,
};

/// Await a repository call for at most `millis`, translating its failure into a domain error.
pub(crate) async fn bounded<T, F>(
    millis: u64,
    call: F,
    translate: fn(RepositoryError) -> DomainError,
) -> DomainResult<T>
where
    F: Future<Output = RepositoryResult<T>>,
{
    match tokio::time::timeout(Duration::from_millis(millis), call).await {
        Ok(result) => result.map_err(translate),
        Err(_) => {
            tracing::warn!(timeout_ms = millis, "repository call timed out");
            Err(DomainError::Timeout)
        }
    }
}

/// Ownership-aware task operations.
///
/// Lookups run in a fixed order: existence, then ownership, then payload validation.
/// A caller who may not touch a task learns nothing about whether their payload was valid.
#[derive(Clone)]
pub struct TaskUsecase {
    repository: Arc<dyn TaskRepository>,
    owners: Arc<dyn UserRepository>,
    timeouts: Timeouts,
}

impl TaskUsecase {
    pub fn new(repository: Arc<dyn TaskRepository>, owners: Arc<dyn UserRepository>, timeouts: Timeouts) -> Self {
        Self {
            repository,
            owners,
            timeouts,
        }
    }

    pub async fn create(&self, caller: &Caller, request: CreateTaskRequest) -> DomainResult<Task> {
        validate_title(&request.title)?;
        let now = Utc::now();
        validate_due_date(request.due_date, now)?;

        let task = Task {
            id: Uuid::new_v4(),
            title: request.title,
            description: request.description,
            status: request.status.unwrap_or_default(),
            priority: request.priority,
            owner: caller.id,
            created_at: now,
            updated_at: now,
            due_date: request.due_date,
        };

        bounded(
            self.timeouts.task_create,
            self.repository.create(&task),
            DomainError::from_task_repository,
        )
        .await?;

        // The owner's account may have been deleted while this request was in flight. Account
        // removal deletes the user before sweeping tasks, so either that sweep saw this insert
        // or this lookup sees the account gone.
        match bounded(
            self.timeouts.task_get,
            self.owners.get_by_id(task.owner),
            DomainError::from_user_repository,
        )
        .await
        {
            Ok(_) => {}
            Err(DomainError::UserNotFound) => {
                tracing::warn!(task_id = %task.id, owner = %task.owner, "owner vanished during create");
                match bounded(
                    self.timeouts.task_delete,
                    self.repository.delete(task.id),
                    DomainError::from_task_repository,
                )
                .await
                {
                    Ok(()) | Err(DomainError::TaskNotFound) => {}
                    Err(e) => return Err(e),
                }
                return Err(DomainError::Unauthenticated);
            }
            Err(e) => return Err(e),
        }

        tracing::info!(task_id = %task.id, owner = %task.owner, "task created");
        Ok(task)
    }

    pub async fn get_by_id(&self, caller: &Caller, id: Uuid) -> DomainResult<Task> {
        let task = self.fetch(id).await?;
        Self::authorize(caller, &task)?;
        Ok(task)
    }

    /// Admins see every task, everyone else their own. Nothing to show is an empty list.
    pub async fn get_all_for_caller(&self, caller: &Caller) -> DomainResult<Vec<Task>> {
        let listing = if caller.is_admin() {
            self.repository.get_all()
        } else {
            self.repository.get_by_owner(caller.id)
        };
        let tasks = bounded(self.timeouts.task_list, listing, DomainError::from_task_repository).await?;

        tracing::debug!(caller = %caller.id, count = tasks.len(), "tasks listed");
        Ok(tasks)
    }

    /// Apply the fields present in `request`. `id`, `owner` and `created_at` never change.
    ///
    /// Ownership, validation and the write happen inside one repository step, so two
    /// concurrent updates see each other's result instead of overwriting it.
    pub async fn update(&self, caller: &Caller, id: Uuid, request: UpdateTaskRequest) -> DomainResult<Task> {
        let who = *caller;
        let mutate: TaskMutation = Box::new(move |task: &mut Task| Self::apply(&who, task, request));

        let task = bounded(
            self.timeouts.task_update,
            self.repository.update_with(id, mutate),
            DomainError::from_task_repository,
        )
        .await??;

        tracing::info!(task_id = %task.id, caller = %caller.id, status = %task.status, "task updated");
        Ok(task)
    }

    pub async fn delete(&self, caller: &Caller, id: Uuid) -> DomainResult<()> {
        let task = self.fetch(id).await?;
        Self::authorize(caller, &task)?;

        bounded(
            self.timeouts.task_delete,
            self.repository.delete(id),
            DomainError::from_task_repository,
        )
        .await?;

        tracing::info!(task_id = %id, caller = %caller.id, "task deleted");
        Ok(())
    }

    /// Cascade step of account removal. Callers are responsible for authorizing it.
    pub async fn delete_all_for_owner(&self, owner: Uuid) -> DomainResult<usize> {
        let removed = bounded(
            self.timeouts.task_delete,
            self.repository.delete_by_owner(owner),
            DomainError::from_task_repository,
        )
        .await?;

        tracing::info!(owner = %owner, removed, "owner's tasks deleted");
        Ok(removed)
    }

    pub async fn clear_all(&self, caller: &Caller) -> DomainResult<usize> {
        if !caller.is_admin() {
            tracing::warn!(caller = %caller.id, "non-admin attempted to purge tasks");
            return Err(DomainError::AccessDenied);
        }

        let removed = bounded(
            self.timeouts.task_delete,
            self.repository.clear(),
            DomainError::from_task_repository,
        )
        .await?;

        tracing::warn!(caller = %caller.id, removed, "all tasks purged");
        Ok(removed)
    }

    async fn fetch(&self, id: Uuid) -> DomainResult<Task> {
        bounded(
            self.timeouts.task_get,
            self.repository.get_by_id(id),
            DomainError::from_task_repository,
        )
        .await
    }

    /// Returns whether anything changed. An empty request leaves `updated_at` alone.
    fn apply(caller: &Caller, task: &mut Task, request: UpdateTaskRequest) -> DomainResult<bool> {
        Self::authorize(caller, task)?;

        if let Some(title) = &request.title {
            validate_title(title)?;
        }
        if let Some(status) = request.status {
            validate_transition(task.status, status)?;
        }
        if let Some(due_date) = request.due_date {
            validate_due_date(due_date, task.created_at)?;
        }

        if request.is_empty() {
            return Ok(false);
        }

        if let Some(title) = request.title {
            task.title = title;
        }
        if let Some(description) = request.description {
            task.description = description;
        }
        if let Some(status) = request.status {
            task.status = status;
        }
        if let Some(priority) = request.priority {
            task.priority = priority;
        }
        if let Some(due_date) = request.due_date {
            task.due_date = due_date;
        }
        task.touch(Utc::now());
        Ok(true)
    }

    fn authorize(caller: &Caller, task: &Task) -> DomainResult<()> {
        if caller.may_access(task.owner) {
            Ok(())
        } else {
            tracing::warn!(task_id = %task.id, caller = %caller.id, "access denied");
            Err(DomainError::AccessDenied)
        }
    }
}
