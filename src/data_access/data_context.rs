//! redb-backed task and user stores.
//!
//! Every mutating call is a single write transaction keyed by id, so the existence check
//! and the write it guards commit together or not at all. redb blocks, so each call runs
//! on tokio's blocking pool.

use std::sync::Arc;
#[cfg(feature = "profile")]
use std::time::Instant;

use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};
use serde::{de::DeserializeOwned, Serialize};
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

const TASKS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("tasks");
const USERS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("users");
const EMAIL_INDEX: TableDefinition<&str, &[u8]> = TableDefinition::new("email_index");

/// Thin handle to the redb file. Cloneable (Arc inside).
#[derive(Clone)]
pub struct DataContext {
    db: Arc<Database>,
}

impl DataContext {
    /// Open (or create) the database at the given path. Creates tables if they don't exist.
    pub fn open(path: &str) -> RepositoryResult<Self> {
        let db = Database::create(path)?;
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(TASKS_TABLE)?;
            let _ = write_txn.open_table(USERS_TABLE)?;
            let _ = write_txn.open_table(EMAIL_INDEX)?;
        }
        write_txn.commit()?;
        Ok(DataContext { db: Arc::new(db) })
    }

    async fn blocking<T, F>(&self, op: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> RepositoryResult<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| RepositoryError::Storage(format!("blocking task failed: {e}")))?
    }
}

fn encode<T: Serialize>(value: &T) -> RepositoryResult<Vec<u8>> {
    postcard::to_allocvec(value).map_err(|e| RepositoryError::Encode(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> RepositoryResult<T> {
    postcard::from_bytes(bytes).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn read_tasks<F>(db: &Database, mut keep: F) -> RepositoryResult<Vec<Task>>
where
    F: FnMut(&Task) -> bool,
{
    let read_txn = db.begin_read()?;
    let tasks_table = read_txn.open_table(TASKS_TABLE)?;

    let mut tasks = Vec::new();
    for entry in tasks_table.iter()? {
        let (_, value) = entry?;
        let task: Task = decode(value.value())?;
        if keep(&task) {
            tasks.push(task);
        }
    }
    Ok(tasks)
}

/// Delete every task matching `doomed` in one transaction.
fn remove_tasks<F>(db: &Database, mut doomed: F) -> RepositoryResult<usize>
where
    F: FnMut(&Task) -> bool,
{
    #[cfg(feature = "profile")]
    let start = Instant::now();
    let write_txn = db.begin_write()?;
    let removed;
    {
        let mut tasks_table = write_txn.open_table(TASKS_TABLE)?;
        let mut keys = Vec::new();
        for entry in tasks_table.iter()? {
            let (key, value) = entry?;
            let task: Task = decode(value.value())?;
            if doomed(&task) {
                keys.push(key.value().to_vec());
            }
        }
        for key in &keys {
            tasks_table.remove(key.as_slice())?;
        }
        removed = keys.len();
    }
    write_txn.commit()?;
    #[cfg(feature = "profile")]
    tracing::debug!(elapsed_us = start.elapsed().as_micros() as u64, removed, "bulk task delete committed");
    Ok(removed)
}

#[async_trait]
impl TaskRepository for DataContext {
    async fn create(&self, task: &Task) -> RepositoryResult<()> {
        let task = task.clone();
        self.blocking(move |db| {
            #[cfg(feature = "profile")]
            let start = Instant::now();
            let task_bytes = encode(&task)?;
            let write_txn = db.begin_write()?;
            {
                let mut tasks_table = write_txn.open_table(TASKS_TABLE)?;
                let id_bytes = task.id.as_bytes();
                if tasks_table.get(id_bytes.as_slice())?.is_some() {
                    return Err(RepositoryError::Duplicate);
                }
                tasks_table.insert(id_bytes.as_slice(), task_bytes.as_slice())?;
            }
            write_txn.commit()?;
            #[cfg(feature = "profile")]
            tracing::debug!(elapsed_us = start.elapsed().as_micros() as u64, "task insert committed");
            Ok(())
        })
        .await
    }

    async fn update(&self, task: &Task) -> RepositoryResult<()> {
        let task = task.clone();
        self.blocking(move |db| {
            let task_bytes = encode(&task)?;
            let write_txn = db.begin_write()?;
            {
                let mut tasks_table = write_txn.open_table(TASKS_TABLE)?;
                let id_bytes = task.id.as_bytes();
                if tasks_table.get(id_bytes.as_slice())?.is_none() {
                    return Err(RepositoryError::NotFound);
                }
                tasks_table.insert(id_bytes.as_slice(), task_bytes.as_slice())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn update_with(&self, id: Uuid, mutate: TaskMutation) -> RepositoryResult<DomainResult<Task>> {
        self.blocking(move |db| {
            #[cfg(feature = "profile")]
            let start = Instant::now();
            let write_txn = db.begin_write()?;
            let outcome;
            {
                let mut tasks_table = write_txn.open_table(TASKS_TABLE)?;
                let id_bytes = id.as_bytes();
                let mut task: Task = match tasks_table.get(id_bytes.as_slice())? {
                    Some(data) => decode(data.value())?,
                    None => return Err(RepositoryError::NotFound),
                };
                outcome = match mutate(&mut task) {
                    Ok(true) => {
                        let task_bytes = encode(&task)?;
                        tasks_table.insert(id_bytes.as_slice(), task_bytes.as_slice())?;
                        Ok(task)
                    }
                    Ok(false) => Ok(task),
                    Err(e) => Err(e),
                };
            }
            if outcome.is_ok() {
                write_txn.commit()?;
            } else {
                write_txn.abort()?;
            }
            #[cfg(feature = "profile")]
            tracing::debug!(elapsed_us = start.elapsed().as_micros() as u64, "task read-modify-write finished");
            Ok(outcome)
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        self.blocking(move |db| {
            let write_txn = db.begin_write()?;
            let deleted;
            {
                let mut tasks_table = write_txn.open_table(TASKS_TABLE)?;
                let id_bytes = id.as_bytes();
                let result = tasks_table.remove(id_bytes.as_slice())?;
                deleted = result.is_some();
            }
            if !deleted {
                return Err(RepositoryError::NotFound);
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Task> {
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let tasks_table = read_txn.open_table(TASKS_TABLE)?;

            let id_bytes = id.as_bytes();
            let task = match tasks_table.get(id_bytes.as_slice())? {
                Some(data) => decode(data.value())?,
                None => return Err(RepositoryError::NotFound),
            };
            Ok(task)
        })
        .await
    }

    async fn get_by_owner(&self, owner: Uuid) -> RepositoryResult<Vec<Task>> {
        self.blocking(move |db| read_tasks(db, |t| t.owner == owner)).await
    }

    async fn get_all(&self) -> RepositoryResult<Vec<Task>> {
        self.blocking(|db| read_tasks(db, |_| true)).await
    }

    async fn delete_by_owner(&self, owner: Uuid) -> RepositoryResult<usize> {
        self.blocking(move |db| remove_tasks(db, |t| t.owner == owner)).await
    }

    async fn clear(&self) -> RepositoryResult<usize> {
        self.blocking(|db| remove_tasks(db, |_| true)).await
    }
}

#[async_trait]
impl UserRepository for DataContext {
    async fn create(&self, user: &User) -> RepositoryResult<()> {
        let user = user.clone();
        self.blocking(move |db| {
            let user_bytes = encode(&user)?;
            let write_txn = db.begin_write()?;
            {
                let mut users_table = write_txn.open_table(USERS_TABLE)?;
                let mut email_index = write_txn.open_table(EMAIL_INDEX)?;
                let id_bytes = user.id.as_bytes();
                if users_table.get(id_bytes.as_slice())?.is_some()
                    || email_index.get(user.email.as_str())?.is_some()
                {
                    return Err(RepositoryError::Duplicate);
                }
                users_table.insert(id_bytes.as_slice(), user_bytes.as_slice())?;
                email_index.insert(user.email.as_str(), id_bytes.as_slice())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<User> {
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let users_table = read_txn.open_table(USERS_TABLE)?;
            let id_bytes = id.as_bytes();
            let user = match users_table.get(id_bytes.as_slice())? {
                Some(data) => decode(data.value())?,
                None => return Err(RepositoryError::NotFound),
            };
            Ok(user)
        })
        .await
    }

    async fn get_by_email(&self, email: &str) -> RepositoryResult<User> {
        let email = email.to_string();
        self.blocking(move |db| {
            let read_txn = db.begin_read()?;
            let email_index = read_txn.open_table(EMAIL_INDEX)?;

            let users_table = read_txn.open_table(USERS_TABLE)?;

            let id_bytes = match email_index.get(email.as_str())? {
                Some(id_data) => id_data.value().to_vec(),
                None => return Err(RepositoryError::NotFound),
            };
            let user = match users_table.get(id_bytes.as_slice())? {
                Some(user_data) => decode(user_data.value())?,
                None => return Err(RepositoryError::NotFound),
            };
            Ok(user)
        })
        .await
    }

    async fn update(&self, user: &User) -> RepositoryResult<()> {
        let user = user.clone();
        self.blocking(move |db| {
            let user_bytes = encode(&user)?;
            let write_txn = db.begin_write()?;
            {
                let mut users_table = write_txn.open_table(USERS_TABLE)?;
                let mut email_index = write_txn.open_table(EMAIL_INDEX)?;
                let id_bytes = user.id.as_bytes();

                let previous: User = match users_table.get(id_bytes.as_slice())? {
                    Some(data) => decode(data.value())?,
                    None => return Err(RepositoryError::NotFound),
                };
                let taken_by_other = match email_index.get(user.email.as_str())? {
                    Some(owner) => owner.value() != id_bytes.as_slice(),
                    None => false,
                };
                if taken_by_other {
                    return Err(RepositoryError::Duplicate);
                }

                users_table.insert(id_bytes.as_slice(), user_bytes.as_slice())?;
                email_index.insert(user.email.as_str(), id_bytes.as_slice())?;
                if previous.email != user.email {
                    email_index.remove(previous.email.as_str())?;
                }
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        self.blocking(move |db| {
            let write_txn = db.begin_write()?;
            {
                let mut users_table = write_txn.open_table(USERS_TABLE)?;
                let mut email_index = write_txn.open_table(EMAIL_INDEX)?;
                let removed = users_table.remove(id.as_bytes().as_slice())?;
                let user: User = match removed {
                    Some(data) => decode(data.value())?,
                    None => return Err(RepositoryError::NotFound),
                };
                email_index.remove(user.email.as_str())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn count(&self) -> RepositoryResult<usize> {
        self.blocking(|db| {
            let read_txn = db.begin_read()?;
            let users_table = read_txn.open_table(USERS_TABLE)?;
            let mut count = 0;
            for entry in users_table.iter()? {
                entry?;
                count += 1;
            }
            Ok(count)
        })
        .await
    }
}

// redb 2.x has many error types. Blanket them all into RepositoryError::Storage.
macro_rules! from_redb {
    ($($t:ty),*) => {
        $(impl From<$t> for RepositoryError {
            fn from(e: $t) -> Self { RepositoryError::Storage(e.to_string()) }
        })*
    };
}

from_redb!(
    redb::Error,
    redb::DatabaseError,
    redb::TableError,
    redb::TransactionError,
    redb::StorageError,
    redb::CommitError
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{role::Role, task_status::TaskStatus};
    use chrono::Utc;
    use std::fs;

    /// Create a temp database file that `cleanup` removes.
    fn temp_db(name: &str) -> (DataContext, String) {
        let path = std::env::temp_dir()
            .join(format!("task_manager_test_{name}_{}.redb", std::process::id()))
            .to_string_lossy()
            .into_owned();
        let _ = fs::remove_file(&path);
        let ctx = DataContext::open(&path).unwrap();
        (ctx, path)
    }

    fn cleanup(path: &str) {
        let _ = fs::remove_file(path);
    }

    fn task_for(owner: Uuid, title: &str) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: title.into(),
            description: Some("details".into()),
            status: TaskStatus::InProgress,
            priority: None,
            owner,
            created_at: now,
            updated_at: now,
            due_date: Some(now),
        }
    }

    #[tokio::test]
    async fn task_round_trip_survives_reopen() {
        let (ctx, path) = temp_db("reopen");
        let task = task_for(Uuid::new_v4(), "Persist me");
        TaskRepository::create(&ctx, &task).await.unwrap();
        drop(ctx);

        let ctx = DataContext::open(&path).unwrap();
        let loaded = TaskRepository::get_by_id(&ctx, task.id).await.unwrap();
        assert_eq!(loaded, task);

        cleanup(&path);
    }

    #[tokio::test]
    async fn task_contract_errors() {
        let (ctx, path) = temp_db("contract");
        let task = task_for(Uuid::new_v4(), "Once");

        TaskRepository::create(&ctx, &task).await.unwrap();
        assert_eq!(TaskRepository::create(&ctx, &task).await, Err(RepositoryError::Duplicate));

        let ghost = task_for(Uuid::new_v4(), "Ghost");
        assert_eq!(TaskRepository::update(&ctx, &ghost).await, Err(RepositoryError::NotFound));
        assert_eq!(TaskRepository::delete(&ctx, ghost.id).await, Err(RepositoryError::NotFound));

        TaskRepository::delete(&ctx, task.id).await.unwrap();
        assert_eq!(TaskRepository::get_by_id(&ctx, task.id).await, Err(RepositoryError::NotFound));

        cleanup(&path);
    }

    #[tokio::test]
    async fn mutation_commits_only_on_success() {
        let (ctx, path) = temp_db("mutate");
        let task = task_for(Uuid::new_v4(), "Original");
        TaskRepository::create(&ctx, &task).await.unwrap();

        let rejected = ctx
            .update_with(
                task.id,
                Box::new(|t: &mut Task| {
                    t.title = "Half-done".into();
                    Err(crate::DomainError::AccessDenied)
                }),
            )
            .await
            .unwrap();
        assert_eq!(rejected, Err(crate::DomainError::AccessDenied));
        assert_eq!(TaskRepository::get_by_id(&ctx, task.id).await.unwrap().title, "Original");

        ctx.update_with(
            task.id,
            Box::new(|t: &mut Task| {
                t.status = TaskStatus::Completed;
                Ok(true)
            }),
        )
        .await
        .unwrap()
        .unwrap();
        let stored = TaskRepository::get_by_id(&ctx, task.id).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Completed);

        let missing = ctx.update_with(Uuid::new_v4(), Box::new(|_: &mut Task| Ok(true))).await;
        assert_eq!(missing, Err(RepositoryError::NotFound));

        cleanup(&path);
    }

    #[tokio::test]
    async fn owner_filter_and_cascade() {
        let (ctx, path) = temp_db("cascade");
        let doomed = Uuid::new_v4();
        let kept = Uuid::new_v4();
        TaskRepository::create(&ctx, &task_for(doomed, "a")).await.unwrap();
        TaskRepository::create(&ctx, &task_for(doomed, "b")).await.unwrap();
        TaskRepository::create(&ctx, &task_for(kept, "c")).await.unwrap();

        assert_eq!(ctx.get_by_owner(doomed).await.unwrap().len(), 2);
        assert_eq!(ctx.delete_by_owner(doomed).await.unwrap(), 2);
        let remaining = ctx.get_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].owner, kept);

        assert_eq!(ctx.clear().await.unwrap(), 1);
        assert!(ctx.get_all().await.unwrap().is_empty());

        cleanup(&path);
    }

    #[tokio::test]
    async fn users_indexed_by_email() {
        let (ctx, path) = temp_db("users");
        let mut user = User::new("u1@example.com", "hash".into(), Role::Regular);

        UserRepository::create(&ctx, &user).await.unwrap();
        let clash = User::new("u1@example.com", "hash".into(), Role::Regular);
        assert_eq!(UserRepository::create(&ctx, &clash).await, Err(RepositoryError::Duplicate));
        assert_eq!(ctx.get_by_email("u1@example.com").await.unwrap().id, user.id);

        user.email = "renamed@example.com".into();
        UserRepository::update(&ctx, &user).await.unwrap();
        assert_eq!(ctx.get_by_email("u1@example.com").await, Err(RepositoryError::NotFound));
        assert_eq!(ctx.get_by_email("renamed@example.com").await.unwrap().id, user.id);

        UserRepository::delete(&ctx, user.id).await.unwrap();
        assert_eq!(ctx.count().await.unwrap(), 0);
        assert_eq!(ctx.get_by_email("renamed@example.com").await, Err(RepositoryError::NotFound));

        cleanup(&path);
    }
}
