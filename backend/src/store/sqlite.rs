//! Relational backend on SQLite.
//!
//! # Invariants
//! - `id` is `AUTOINCREMENT`, so deleted ids are never handed out again.
//! - Every mutation is one statement with `RETURNING`, the row read back is
//!   the row written.

use std::str::FromStr;
use std::time::Instant;

use chrono::{DateTime, Utc};
use shared::{NewTask, Priority, Task, TaskFilter, TaskId, TaskStats};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::{error, info};

use super::{StoreError, StoreResult, TaskStore};

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    completed BOOLEAN NOT NULL DEFAULT 0,
    priority TEXT NOT NULL DEFAULT 'normal',
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

const TASK_COLUMNS: &str = "id, title, completed, priority, created_at";

#[derive(Debug, FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    completed: bool,
    priority: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let priority = Priority::from_str(&row.priority).map_err(|_| {
            StoreError::InvalidData(format!("task {} has priority `{}`", row.id, row.priority))
        })?;
        Ok(Task {
            id: TaskId::new(row.id),
            title: row.title,
            completed: row.completed,
            priority,
            created_at: row.created_at,
        })
    }
}

fn into_tasks(rows: Vec<TaskRow>) -> StoreResult<Vec<Task>> {
    rows.into_iter().map(Task::try_from).collect()
}

#[derive(Debug, FromRow)]
struct CountsRow {
    total: i64,
    completed: i64,
    high: i64,
    normal: i64,
    low: i64,
}

#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    /// Opens (creating if missing) the database at `url` and applies the schema.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Self::bootstrap(pool, "file").await
    }

    /// Private in-memory database. A single pinned connection keeps it alive.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::bootstrap(pool, "memory").await
    }

    async fn bootstrap(pool: SqlitePool, mode: &str) -> StoreResult<Self> {
        let started_at = Instant::now();
        match sqlx::query(SCHEMA_SQL).execute(&pool).await {
            Ok(_) => {
                info!(
                    mode,
                    duration_ms = started_at.elapsed().as_millis() as u64,
                    "sqlite schema ready"
                );
                Ok(Self { pool })
            }
            Err(err) => {
                error!(mode, error = %err, "sqlite schema bootstrap failed");
                Err(err.into())
            }
        }
    }

    async fn fetch_one_task(&self, sql: &str, id: TaskId) -> StoreResult<Task> {
        sqlx::query_as::<_, TaskRow>(sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))
            .and_then(Task::try_from)
    }
}

impl TaskStore for SqliteTaskStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn insert(&self, draft: NewTask) -> StoreResult<Task> {
        let sql = format!(
            "INSERT INTO tasks (title, completed, priority, created_at)
             VALUES (?, 0, ?, ?)
             RETURNING {TASK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(draft.title)
            .bind(draft.priority.as_str())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        Task::try_from(row)
    }

    async fn get(&self, id: TaskId) -> StoreResult<Task> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?");
        self.fetch_one_task(&sql, id).await
    }

    async fn complete(&self, id: TaskId) -> StoreResult<Task> {
        let sql = format!("UPDATE tasks SET completed = 1 WHERE id = ? RETURNING {TASK_COLUMNS}");
        self.fetch_one_task(&sql, id).await
    }

    async fn delete(&self, id: TaskId) -> StoreResult<Task> {
        let sql = format!("DELETE FROM tasks WHERE id = ? RETURNING {TASK_COLUMNS}");
        self.fetch_one_task(&sql, id).await
    }

    async fn all(&self) -> StoreResult<Vec<Task>> {
        self.list(TaskFilter::All).await
    }

    async fn list(&self, filter: TaskFilter) -> StoreResult<Vec<Task>> {
        let predicate = match filter {
            TaskFilter::All => "1 = 1",
            TaskFilter::Completed => "completed = 1",
            TaskFilter::Pending => "completed = 0",
            TaskFilter::High => "priority = 'high'",
        };
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE {predicate} ORDER BY id ASC");
        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        into_tasks(rows)
    }

    async fn stats(&self) -> StoreResult<TaskStats> {
        let counts = sqlx::query_as::<_, CountsRow>(
            "SELECT
                COUNT(*) AS total,
                COALESCE(SUM(completed = 1), 0) AS completed,
                COALESCE(SUM(priority = 'high'), 0) AS high,
                COALESCE(SUM(priority = 'normal'), 0) AS normal,
                COALESCE(SUM(priority = 'low'), 0) AS low
            FROM tasks",
        )
        .fetch_one(&self.pool)
        .await?;
        let count = |value: i64| u64::try_from(value).unwrap_or_default();
        Ok(TaskStats::from_counts(
            count(counts.total),
            count(counts.completed),
            count(counts.high),
            count(counts.normal),
            count(counts.low),
        ))
    }

    async fn health(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_priority_in_row_is_reported() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        sqlx::query("INSERT INTO tasks (title, priority, created_at) VALUES ('odd', 'urgent', ?)")
            .bind(Utc::now())
            .execute(&store.pool)
            .await
            .unwrap();

        let err = store.all().await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[tokio::test]
    async fn autoincrement_never_reuses_ids() {
        let store = SqliteTaskStore::in_memory().await.unwrap();
        let first = store.create("first", None).await.unwrap();
        store.delete(first.id).await.unwrap();
        let second = store.create("second", None).await.unwrap();
        assert!(second.id > first.id);
    }
}
