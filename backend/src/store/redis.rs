//! Redis backend. One JSON document per task plus a sorted index for ordering.
//!
//! Read-modify-write operations run as `WATCH` + `MULTI`/`EXEC` on a dedicated
//! connection and retry when another writer touched the task in between.

use std::sync::Arc;

use chrono::Utc;
use redis::aio::Connection;
use redis::{AsyncCommands, Client};
use shared::{NewTask, Task, TaskId};
use tracing::{debug, warn};

use super::{StoreError, StoreResult, TaskStore};

fn decode_task(json: &str) -> StoreResult<Task> {
    Ok(serde_json::from_str(json)?)
}

#[derive(Clone)]
pub struct RedisTaskStore {
    client: Arc<Client>,
    /// Prepended to every key, so several boards can share one database.
    namespace: String,
}

impl RedisTaskStore {
    /// Parses the URL. No connection is made until the first operation.
    pub fn open(redis_url: &str) -> StoreResult<Self> {
        Self::with_namespace(redis_url, "")
    }

    pub fn with_namespace(redis_url: &str, namespace: impl Into<String>) -> StoreResult<Self> {
        let client = Client::open(redis_url)?;
        Ok(Self {
            client: Arc::new(client),
            namespace: namespace.into(),
        })
    }

    fn task_key(&self, id: TaskId) -> String {
        format!("{}task:{}", self.namespace, id)
    }

    fn next_id_key(&self) -> String {
        format!("{}tasks:next_id", self.namespace)
    }

    fn index_key(&self) -> String {
        format!("{}tasks:index", self.namespace)
    }

    async fn connection(&self) -> StoreResult<Connection> {
        Ok(self.client.get_async_connection().await?)
    }

    async fn load(&self, conn: &mut Connection, id: TaskId) -> StoreResult<Task> {
        let task_json: Option<String> = conn.get(self.task_key(id)).await?;
        match task_json {
            Some(json) => decode_task(&json),
            None => Err(StoreError::NotFound(id)),
        }
    }

    /// Watches the task key and loads the task. On failure the watch is dropped.
    async fn watch_and_load(&self, conn: &mut Connection, id: TaskId) -> StoreResult<Task> {
        redis::cmd("WATCH")
            .arg(self.task_key(id))
            .query_async::<_, ()>(conn)
            .await?;
        match self.load(conn, id).await {
            Ok(task) => Ok(task),
            Err(err) => {
                unwatch(conn).await?;
                Err(err)
            }
        }
    }
}

async fn unwatch(conn: &mut Connection) -> StoreResult<()> {
    redis::cmd("UNWATCH").query_async::<_, ()>(conn).await?;
    Ok(())
}

impl TaskStore for RedisTaskStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn insert(&self, draft: NewTask) -> StoreResult<Task> {
        let mut conn = self.connection().await?;
        let next: i64 = conn.incr(self.next_id_key(), 1).await?;
        let task = draft.into_task(TaskId::new(next), Utc::now());
        let task_json = serde_json::to_string(&task)?;

        redis::pipe()
            .atomic()
            .set(self.task_key(task.id), &task_json)
            .ignore()
            .zadd(self.index_key(), task.id.get(), task.id.get())
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;
        debug!(task_id = %task.id, "task stored in redis");
        Ok(task)
    }

    async fn get(&self, id: TaskId) -> StoreResult<Task> {
        let mut conn = self.connection().await?;
        self.load(&mut conn, id).await
    }

    async fn complete(&self, id: TaskId) -> StoreResult<Task> {
        let mut conn = self.connection().await?;
        loop {
            let mut task = self.watch_and_load(&mut conn, id).await?;
            if task.completed {
                unwatch(&mut conn).await?;
                return Ok(task);
            }
            task.complete();
            let task_json = serde_json::to_string(&task)?;
            // EXEC answers nil when the watched key changed.
            let committed: Option<()> = redis::pipe()
                .atomic()
                .set(self.task_key(id), task_json)
                .ignore()
                .query_async(&mut conn)
                .await?;
            if committed.is_some() {
                return Ok(task);
            }
            debug!(task_id = %id, "complete raced with another writer, retrying");
        }
    }

    async fn delete(&self, id: TaskId) -> StoreResult<Task> {
        let mut conn = self.connection().await?;
        loop {
            let task = self.watch_and_load(&mut conn, id).await?;
            let committed: Option<()> = redis::pipe()
                .atomic()
                .del(self.task_key(id))
                .ignore()
                .zrem(self.index_key(), id.get())
                .ignore()
                .query_async(&mut conn)
                .await?;
            if committed.is_some() {
                return Ok(task);
            }
            debug!(task_id = %id, "delete raced with another writer, retrying");
        }
    }

    async fn all(&self) -> StoreResult<Vec<Task>> {
        let mut conn = self.connection().await?;
        let ids: Vec<i64> = conn.zrange(self.index_key(), 0, -1).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids
            .iter()
            .map(|id| self.task_key(TaskId::new(*id)))
            .collect();
        let documents: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        let mut tasks = Vec::with_capacity(documents.len());
        for (key, document) in keys.iter().zip(documents) {
            match document {
                Some(json) => tasks.push(decode_task(&json)?),
                None => warn!(key = %key, "index entry without a task document"),
            }
        }
        Ok(tasks)
    }

    async fn health(&self) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Priority;

    /// Store under a fresh namespace on `REDIS_URL`, or `None` when no server is configured.
    fn live_store(name: &str) -> Option<RedisTaskStore> {
        let url = std::env::var("REDIS_URL").ok()?;
        let namespace = format!("taskboard-test:{}:{}:", name, std::process::id());
        Some(RedisTaskStore::with_namespace(&url, namespace).unwrap())
    }

    #[test]
    fn keys_live_under_the_namespace() {
        let store = RedisTaskStore::with_namespace("redis://127.0.0.1:6379", "board:").unwrap();
        assert_eq!(store.task_key(TaskId::new(42)), "board:task:42");
        assert_eq!(store.next_id_key(), "board:tasks:next_id");
        assert_eq!(store.index_key(), "board:tasks:index");
    }

    #[test]
    fn task_keys_do_not_collide_with_bookkeeping_keys() {
        let store = RedisTaskStore::open("redis://127.0.0.1:6379").unwrap();
        assert_eq!(store.task_key(TaskId::new(42)), "task:42");
        assert!(!store.next_id_key().starts_with("task:"));
        assert!(!store.index_key().starts_with("task:"));
    }

    #[test]
    fn stored_document_decodes_back_into_a_task() {
        let task = NewTask::parse("Buy milk", Some("high"))
            .unwrap()
            .into_task(TaskId::new(3), Utc::now());
        let json = serde_json::to_string(&task).unwrap();
        let decoded = decode_task(&json).unwrap();
        assert_eq!(decoded, task);
        assert_eq!(decoded.priority, Priority::High);
    }

    #[test]
    fn corrupt_document_is_a_serialization_error() {
        assert!(matches!(
            decode_task("{\"id\":1}"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn open_rejects_malformed_url() {
        assert!(RedisTaskStore::open("not a url").is_err());
    }

    #[tokio::test]
    async fn enumeration_skips_index_entries_without_documents() {
        let Some(store) = live_store("orphan") else {
            return;
        };
        let kept = store.create("kept", None).await.unwrap();
        let orphan = store.create("orphan", None).await.unwrap();

        let mut conn = store.connection().await.unwrap();
        let _: () = conn.del(store.task_key(orphan.id)).await.unwrap();

        let titles: Vec<String> = store.all().await.unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec![kept.title]);

        let _: () = conn
            .del(&[store.task_key(kept.id), store.next_id_key(), store.index_key()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn complete_after_concurrent_delete_leaves_no_stray_key() {
        let Some(store) = live_store("race") else {
            return;
        };
        let task = store.create("contended", None).await.unwrap();

        let (completed, deleted) = tokio::join!(store.complete(task.id), store.delete(task.id));
        assert!(deleted.is_ok());
        if let Err(err) = completed {
            assert!(matches!(err, StoreError::NotFound(_)));
        }

        let mut conn = store.connection().await.unwrap();
        let exists: bool = conn.exists(store.task_key(task.id)).await.unwrap();
        assert!(!exists);

        let _: () = conn
            .del(&[store.next_id_key(), store.index_key()])
            .await
            .unwrap();
    }
}
