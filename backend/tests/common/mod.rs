//! Behaviour every `TaskStore` backend must share.
//!
//! Each integration test file is its own crate, so helpers unused by one of
//! them would warn without the allow below.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use shared::{Priority, TaskFilter, TaskId, TaskStats, ValidationError};
use taskboard::store::{RedisTaskStore, StoreError, TaskStore};

static REDIS_STORES: AtomicU64 = AtomicU64::new(0);

/// A Redis store under a key prefix no other test shares, or `None` when
/// `REDIS_URL` is unset so the Redis suite passes without a server.
pub fn redis_store() -> Option<RedisTaskStore> {
    let url = std::env::var("REDIS_URL").ok()?;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let namespace = format!(
        "taskboard-test:{}:{}:{}:",
        std::process::id(),
        nanos,
        REDIS_STORES.fetch_add(1, Ordering::Relaxed)
    );
    Some(RedisTaskStore::with_namespace(&url, namespace).unwrap())
}

fn titles(tasks: &[shared::Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.title.as_str()).collect()
}

pub async fn create_returns_pending_task<S: TaskStore>(store: S) {
    let task = store.create("  Buy milk  ", Some("high")).await.unwrap();
    assert_eq!(task.title, "Buy milk");
    assert!(!task.completed);
    assert_eq!(task.priority, Priority::High);
    assert_eq!(store.get(task.id).await.unwrap(), task);
}

pub async fn missing_priority_defaults_to_normal<S: TaskStore>(store: S) {
    let task = store.create("Water plants", None).await.unwrap();
    assert_eq!(task.priority, Priority::Normal);
}

pub async fn blank_title_is_rejected<S: TaskStore>(store: S) {
    for title in ["", "   ", "\t\n"] {
        let err = store.create(title, None).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::EmptyTitle)
        ));
    }
    assert!(store.all().await.unwrap().is_empty());
}

pub async fn unknown_priority_is_rejected<S: TaskStore>(store: S) {
    let err = store.create("Call mom", Some("urgent")).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::UnknownPriority(_))
    ));
    assert!(store.all().await.unwrap().is_empty());
}

pub async fn complete_is_idempotent<S: TaskStore>(store: S) {
    let task = store.create("Laundry", None).await.unwrap();
    let first = store.complete(task.id).await.unwrap();
    let after_first = store.all().await.unwrap();
    let second = store.complete(task.id).await.unwrap();
    assert!(first.completed);
    assert_eq!(first, second);
    assert_eq!(store.all().await.unwrap(), after_first);
    assert_eq!(second.created_at, task.created_at);
}

pub async fn missing_ids_are_not_found<S: TaskStore>(store: S) {
    store.create("Only task", None).await.unwrap();
    let before = store.all().await.unwrap();
    let ghost = TaskId::new(999);

    assert!(matches!(store.complete(ghost).await, Err(StoreError::NotFound(id)) if id == ghost));
    assert!(matches!(store.delete(ghost).await, Err(StoreError::NotFound(id)) if id == ghost));
    assert!(matches!(store.get(ghost).await, Err(StoreError::NotFound(_))));
    assert_eq!(store.all().await.unwrap(), before);
}

pub async fn deleted_task_is_gone<S: TaskStore>(store: S) {
    let a = store.create("Task A", None).await.unwrap();
    store.create("Task B", None).await.unwrap();

    let removed = store.delete(a.id).await.unwrap();
    assert_eq!(removed.title, "Task A");
    assert_eq!(titles(&store.list(TaskFilter::All).await.unwrap()), vec!["Task B"]);

    assert!(matches!(store.delete(a.id).await, Err(StoreError::NotFound(_))));
    assert!(matches!(store.complete(a.id).await, Err(StoreError::NotFound(_))));
}

pub async fn ids_stay_stable_after_delete<S: TaskStore>(store: S) {
    let a = store.create("Task A", None).await.unwrap();
    let b = store.create("Task B", None).await.unwrap();
    store.delete(a.id).await.unwrap();

    let completed = store.complete(b.id).await.unwrap();
    assert_eq!(completed.title, "Task B");

    let c = store.create("Task C", None).await.unwrap();
    assert!(c.id > b.id);
}

pub async fn list_filters_in_insertion_order<S: TaskStore>(store: S) {
    let milk = store.create("Buy milk", Some("high")).await.unwrap();
    store.create("Write report", Some("normal")).await.unwrap();
    store.create("Nap", Some("low")).await.unwrap();
    store.create("Fix bug", Some("high")).await.unwrap();
    store.complete(milk.id).await.unwrap();

    let all = store.list(TaskFilter::All).await.unwrap();
    assert_eq!(titles(&all), vec!["Buy milk", "Write report", "Nap", "Fix bug"]);
    assert_eq!(all, store.all().await.unwrap());

    let completed = store.list(TaskFilter::Completed).await.unwrap();
    assert_eq!(titles(&completed), vec!["Buy milk"]);

    let pending = store.list(TaskFilter::Pending).await.unwrap();
    assert_eq!(titles(&pending), vec!["Write report", "Nap", "Fix bug"]);

    let high = store.list(TaskFilter::High).await.unwrap();
    assert_eq!(titles(&high), vec!["Buy milk", "Fix bug"]);
}

pub async fn stats_on_empty_store<S: TaskStore>(store: S) {
    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total, 0);
    assert_eq!(stats.pending, 0);
    assert_eq!(stats.completion_rate, 0.0);
}

pub async fn stats_match_scenario<S: TaskStore>(store: S) {
    let milk = store.create("Buy milk", Some("high")).await.unwrap();
    store.create("Write report", Some("normal")).await.unwrap();
    store.complete(milk.id).await.unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(
        stats,
        TaskStats {
            total: 2,
            completed: 1,
            pending: 1,
            completion_rate: 50.0,
            high_priority: 1,
            normal_priority: 1,
            low_priority: 0,
        }
    );
    assert_eq!(stats.total, stats.completed + stats.pending);
}

pub async fn health_is_ok<S: TaskStore>(store: S) {
    store.health().await.unwrap();
}
