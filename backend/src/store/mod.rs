//! Task storage backends.
//!
//! Every backend implements [`TaskStore`] with the same semantics: ids come
//! from a counter and are never reused, listings are in insertion order, and
//! each mutation is applied as a single step against the backing store.

use std::future::Future;

use shared::{NewTask, Task, TaskFilter, TaskId, TaskStats, ValidationError};
use thiserror::Error;

pub mod memory;
pub mod redis;
pub mod sqlite;

pub use self::memory::MemoryTaskStore;
pub use self::redis::RedisTaskStore;
pub use self::sqlite::SqliteTaskStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("task {0} not found")]
    NotFound(TaskId),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A persisted record could not be turned back into a task.
    #[error("invalid persisted task: {0}")]
    InvalidData(String),
}

/// Owner of the task collection.
///
/// Futures are `Send` so handlers generic over the store can run on the
/// multi-threaded runtime.
pub trait TaskStore: Clone + Send + Sync + 'static {
    /// Short name reported by the health endpoint.
    fn backend(&self) -> &'static str;

    /// Validates the input, then appends a new pending task.
    fn create(
        &self,
        title: &str,
        priority: Option<&str>,
    ) -> impl Future<Output = StoreResult<Task>> + Send {
        let draft = NewTask::parse(title, priority);
        async move { self.insert(draft?).await }
    }

    /// Appends an already validated task and assigns its id.
    fn insert(&self, draft: NewTask) -> impl Future<Output = StoreResult<Task>> + Send;

    fn get(&self, id: TaskId) -> impl Future<Output = StoreResult<Task>> + Send;

    /// Sets `completed`. Completing a finished task is a successful no-op.
    fn complete(&self, id: TaskId) -> impl Future<Output = StoreResult<Task>> + Send;

    /// Removes the task for good and returns its last state.
    fn delete(&self, id: TaskId) -> impl Future<Output = StoreResult<Task>> + Send;

    /// Every task in insertion order.
    fn all(&self) -> impl Future<Output = StoreResult<Vec<Task>>> + Send;

    fn list(&self, filter: TaskFilter) -> impl Future<Output = StoreResult<Vec<Task>>> + Send {
        async move {
            let mut tasks = self.all().await?;
            tasks.retain(|task| filter.matches(task));
            Ok(tasks)
        }
    }

    fn stats(&self) -> impl Future<Output = StoreResult<TaskStats>> + Send {
        async move {
            let tasks = self.all().await?;
            Ok(TaskStats::from_tasks(&tasks))
        }
    }

    /// Read-only connectivity check against the backing store.
    fn health(&self) -> impl Future<Output = StoreResult<()>> + Send;
}
