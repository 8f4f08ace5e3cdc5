use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use shared::{CreateTaskRequest, TaskExport, TaskId, TaskStats, TaskSummary};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::store::TaskStore;

pub async fn list_tasks<S: TaskStore>(State(store): State<S>) -> Result<Json<TaskExport>, ApiError> {
    let tasks = store.all().await?;
    Ok(Json(TaskExport::from_tasks(&tasks)))
}

pub async fn create_task<S: TaskStore>(
    State(store): State<S>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskSummary>), ApiError> {
    let task = store
        .create(&payload.title, payload.priority.as_deref())
        .await?;
    info!(task_id = %task.id, priority = %task.priority, "task created via api");
    Ok((StatusCode::CREATED, Json(task.summary())))
}

pub async fn get_task<S: TaskStore>(
    State(store): State<S>,
    Path(id): Path<i64>,
) -> Result<Json<TaskSummary>, ApiError> {
    let task = store.get(TaskId::new(id)).await?;
    Ok(Json(task.summary()))
}

pub async fn complete_task<S: TaskStore>(
    State(store): State<S>,
    Path(id): Path<i64>,
) -> Result<Json<TaskSummary>, ApiError> {
    let task = store.complete(TaskId::new(id)).await?;
    Ok(Json(task.summary()))
}

pub async fn delete_task<S: TaskStore>(
    State(store): State<S>,
    Path(id): Path<i64>,
) -> Result<Json<TaskSummary>, ApiError> {
    let task = store.delete(TaskId::new(id)).await?;
    info!(task_id = %task.id, "task deleted via api");
    Ok(Json(task.summary()))
}

pub async fn stats<S: TaskStore>(State(store): State<S>) -> Result<Json<TaskStats>, ApiError> {
    Ok(Json(store.stats().await?))
}

pub async fn health<S: TaskStore>(State(store): State<S>) -> Response {
    match store.health().await {
        Ok(()) => Json(json!({"status": "ok", "backend": store.backend()})).into_response(),
        Err(err) => {
            warn!(backend = store.backend(), error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "unavailable", "backend": store.backend()})),
            )
                .into_response()
        }
    }
}
