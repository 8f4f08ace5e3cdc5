//! Process-memory backend. State lives as long as the server process.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use shared::{NewTask, Task, TaskId};
use tokio::sync::RwLock;
use tracing::debug;

use super::{StoreError, StoreResult, TaskStore};

#[derive(Debug, Default)]
struct Board {
    /// Keyed by id, so iteration order is insertion order.
    tasks: BTreeMap<TaskId, Task>,
    last_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTaskStore {
    board: Arc<RwLock<Board>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for MemoryTaskStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, draft: NewTask) -> StoreResult<Task> {
        let mut board = self.board.write().await;
        board.last_id += 1;
        let task = draft.into_task(TaskId::new(board.last_id), Utc::now());
        board.tasks.insert(task.id, task.clone());
        debug!(task_id = %task.id, "task stored in memory");
        Ok(task)
    }

    async fn get(&self, id: TaskId) -> StoreResult<Task> {
        let board = self.board.read().await;
        board.tasks.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn complete(&self, id: TaskId) -> StoreResult<Task> {
        let mut board = self.board.write().await;
        let task = board.tasks.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        task.complete();
        Ok(task.clone())
    }

    async fn delete(&self, id: TaskId) -> StoreResult<Task> {
        let mut board = self.board.write().await;
        board.tasks.remove(&id).ok_or(StoreError::NotFound(id))
    }

    async fn all(&self) -> StoreResult<Vec<Task>> {
        let board = self.board.read().await;
        Ok(board.tasks.values().cloned().collect())
    }

    async fn health(&self) -> StoreResult<()> {
        Ok(())
    }
}
