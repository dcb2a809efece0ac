//! In-memory task and user stores.
//!
//! Each store is one map behind one [`RwLock`]: writers are serialized, readers run
//! together. Reads hand out clones, so nothing returned can reach back into the map.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    data_access::{
        task_repository::{RepositoryError, RepositoryResult, TaskMutation, TaskRepository},
        user_repository::UserRepository,
    },
    task::Task,
    user::User,
    DomainResult,
};

#[derive(Default)]
pub struct MemoryTaskRepository {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn create(&self, task: &Task) -> RepositoryResult<()> {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return Err(RepositoryError::Duplicate);
        }
        tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn update(&self, task: &Task) -> RepositoryResult<()> {
        let mut tasks = self.tasks.write().await;
        let slot = tasks.get_mut(&task.id).ok_or(RepositoryError::NotFound)?;
        *slot = task.clone();
        Ok(())
    }

    async fn update_with(&self, id: Uuid, mutate: TaskMutation) -> RepositoryResult<DomainResult<Task>> {
        let mut tasks = self.tasks.write().await;
        let slot = tasks.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        let mut draft = slot.clone();
        Ok(match mutate(&mut draft) {
            Ok(true) => {
                *slot = draft.clone();
                Ok(draft)
            }
            Ok(false) => Ok(slot.clone()),
            Err(e) => Err(e),
        })
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut tasks = self.tasks.write().await;
        tasks.remove(&id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Task> {
        let tasks = self.tasks.read().await;
        tasks.get(&id).cloned().ok_or(RepositoryError::NotFound)
    }

    async fn get_by_owner(&self, owner: Uuid) -> RepositoryResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.values().filter(|t| t.owner == owner).cloned().collect())
    }

    async fn get_all(&self) -> RepositoryResult<Vec<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.values().cloned().collect())
    }

    async fn delete_by_owner(&self, owner: Uuid) -> RepositoryResult<usize> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, t| t.owner != owner);
        Ok(before - tasks.len())
    }

    async fn clear(&self) -> RepositoryResult<usize> {
        let mut tasks = self.tasks.write().await;
        let removed = tasks.len();
        tasks.clear();
        Ok(removed)
    }
}

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: &User) -> RepositoryResult<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) || users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Duplicate);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<User> {
        let users = self.users.read().await;
        users.get(&id).cloned().ok_or(RepositoryError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> RepositoryResult<User> {
        let users = self.users.read().await;
        users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn update(&self, user: &User) -> RepositoryResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email && u.id != user.id) {
            return Err(RepositoryError::Duplicate);
        }
        let slot = users.get_mut(&user.id).ok_or(RepositoryError::NotFound)?;
        *slot = user.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut users = self.users.write().await;
        users.remove(&id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    async fn count(&self) -> RepositoryResult<usize> {
        Ok(self.users.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{role::Role, task_status::TaskStatus, DomainError};
    use chrono::Utc;

    fn task_for(owner: Uuid, title: &str) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            status: TaskStatus::Pending,
            priority: None,
            owner,
            created_at: now,
            updated_at: now,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_id() {
        let repo = MemoryTaskRepository::new();
        let task = task_for(Uuid::new_v4(), "Once");

        repo.create(&task).await.unwrap();
        assert_eq!(repo.create(&task).await, Err(RepositoryError::Duplicate));
    }

    #[tokio::test]
    async fn update_and_delete_unknown_id_not_found() {
        let repo = MemoryTaskRepository::new();
        let ghost = task_for(Uuid::new_v4(), "Ghost");

        assert_eq!(repo.update(&ghost).await, Err(RepositoryError::NotFound));
        assert_eq!(repo.delete(ghost.id).await, Err(RepositoryError::NotFound));
        assert_eq!(repo.get_by_id(ghost.id).await, Err(RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn returned_tasks_are_copies() {
        let repo = MemoryTaskRepository::new();
        let owner = Uuid::new_v4();
        let task = task_for(owner, "Original");
        repo.create(&task).await.unwrap();

        let mut listed = repo.get_by_owner(owner).await.unwrap();
        listed[0].title = "Mutated".into();
        let mut all = repo.get_all().await.unwrap();
        all[0].title = "Mutated too".into();

        assert_eq!(repo.get_by_id(task.id).await.unwrap().title, "Original");
    }

    #[tokio::test]
    async fn rejected_mutation_leaves_task_untouched() {
        let repo = MemoryTaskRepository::new();
        let task = task_for(Uuid::new_v4(), "Original");
        repo.create(&task).await.unwrap();

        let outcome = repo
            .update_with(
                task.id,
                Box::new(|t: &mut Task| {
                    t.title = "Half-done".into();
                    Err(DomainError::AccessDenied)
                }),
            )
            .await
            .unwrap();
        assert_eq!(outcome, Err(DomainError::AccessDenied));
        assert_eq!(repo.get_by_id(task.id).await.unwrap().title, "Original");

        let renamed = repo
            .update_with(
                task.id,
                Box::new(|t: &mut Task| {
                    t.title = "Renamed".into();
                    Ok(true)
                }),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.title, "Renamed");
        assert_eq!(repo.get_by_id(task.id).await.unwrap().title, "Renamed");

        let missing = repo.update_with(Uuid::new_v4(), Box::new(|_: &mut Task| Ok(true))).await;
        assert_eq!(missing, Err(RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn delete_by_owner_leaves_other_owners() {
        let repo = MemoryTaskRepository::new();
        let doomed = Uuid::new_v4();
        let kept = Uuid::new_v4();
        repo.create(&task_for(doomed, "a")).await.unwrap();
        repo.create(&task_for(doomed, "b")).await.unwrap();
        repo.create(&task_for(kept, "c")).await.unwrap();

        assert_eq!(repo.delete_by_owner(doomed).await.unwrap(), 2);
        assert!(repo.get_by_owner(doomed).await.unwrap().is_empty());
        assert_eq!(repo.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clear_empties_the_store() {
        let repo = MemoryTaskRepository::new();
        repo.create(&task_for(Uuid::new_v4(), "a")).await.unwrap();
        repo.create(&task_for(Uuid::new_v4(), "b")).await.unwrap();

        assert_eq!(repo.clear().await.unwrap(), 2);
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn user_email_is_unique() {
        let repo = MemoryUserRepository::new();
        let first = User::new("u1@example.com", "hash".into(), Role::Regular);
        let clash = User::new("U1@example.com", "hash".into(), Role::Regular);

        repo.create(&first).await.unwrap();
        assert_eq!(repo.create(&clash).await, Err(RepositoryError::Duplicate));
        assert_eq!(repo.get_by_email("u1@example.com").await.unwrap().id, first.id);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn user_update_cannot_steal_email() {
        let repo = MemoryUserRepository::new();
        let a = User::new("a@example.com", "hash".into(), Role::Regular);
        let mut b = User::new("b@example.com", "hash".into(), Role::Regular);
        repo.create(&a).await.unwrap();
        repo.create(&b).await.unwrap();

        b.email = a.email.clone();
        assert_eq!(repo.update(&b).await, Err(RepositoryError::Duplicate));
    }
}
