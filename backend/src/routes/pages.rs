//! HTML handlers. Mutations answer with a redirect carrying a notice.

use axum::extract::{Form, Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;
use shared::{TaskFilter, TaskId};
use tracing::info;

use crate::error::ApiError;
use crate::store::{StoreError, TaskStore};
use crate::views::{self, Notice};

#[derive(Debug, Deserialize)]
pub struct AddTaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub priority: Option<String>,
}

/// Redirect to `/` with the notice encoded in the query string.
fn redirect_home(notice: Notice) -> Response {
    match serde_urlencoded::to_string(&notice) {
        Ok(query) => Redirect::to(&format!("/?{query}")).into_response(),
        Err(_) => Redirect::to("/").into_response(),
    }
}

/// Turns user-facing store failures into an error notice; the rest become 500s.
fn failure_notice(err: StoreError) -> Result<Response, ApiError> {
    match err {
        StoreError::Validation(err) => Ok(redirect_home(Notice::error(err.to_string()))),
        StoreError::NotFound(_) => Ok(redirect_home(Notice::error("Task not found!"))),
        other => Err(other.into()),
    }
}

pub async fn index<S: TaskStore>(
    State(store): State<S>,
    notice: Option<Query<Notice>>,
) -> Result<Html<String>, ApiError> {
    let tasks = store.all().await?;
    let notice = notice.map(|Query(notice)| notice);
    Ok(Html(views::index_page(&tasks, TaskFilter::All, notice.as_ref())))
}

pub async fn filter<S: TaskStore>(
    State(store): State<S>,
    Path(status): Path<String>,
) -> Result<Html<String>, ApiError> {
    let filter = TaskFilter::parse(&status);
    let tasks = store.list(filter).await?;
    Ok(Html(views::index_page(&tasks, filter, None)))
}

pub async fn add<S: TaskStore>(
    State(store): State<S>,
    Form(form): Form<AddTaskForm>,
) -> Result<Response, ApiError> {
    match store.create(&form.title, form.priority.as_deref()).await {
        Ok(task) => {
            info!(task_id = %task.id, priority = %task.priority, "task added");
            Ok(redirect_home(Notice::success(format!(
                "Task \"{}\" added successfully!",
                task.title
            ))))
        }
        Err(err) => failure_notice(err),
    }
}

pub async fn complete<S: TaskStore>(
    State(store): State<S>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    match store.complete(TaskId::new(id)).await {
        Ok(task) => {
            info!(task_id = %task.id, "task completed");
            Ok(redirect_home(Notice::success(format!(
                "Task \"{}\" completed!",
                task.title
            ))))
        }
        Err(err) => failure_notice(err),
    }
}

pub async fn delete<S: TaskStore>(
    State(store): State<S>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    match store.delete(TaskId::new(id)).await {
        Ok(task) => {
            info!(task_id = %task.id, "task deleted");
            Ok(redirect_home(Notice::success(format!(
                "Task \"{}\" deleted!",
                task.title
            ))))
        }
        Err(err) => failure_notice(err),
    }
}

pub async fn stats<S: TaskStore>(State(store): State<S>) -> Result<Html<String>, ApiError> {
    let stats = store.stats().await?;
    Ok(Html(views::stats_page(&stats, None)))
}
