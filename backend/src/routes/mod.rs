//! Router assembly. Handlers are generic over the store so every backend
//! serves the same routes.

use std::path::Path;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::store::TaskStore;

pub mod api;
pub mod pages;

pub fn build_router<S: TaskStore>(store: S, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(pages::index::<S>))
        .route("/add", post(pages::add::<S>))
        .route("/complete/:id", get(pages::complete::<S>))
        .route("/delete/:id", get(pages::delete::<S>))
        .route("/filter/:status", get(pages::filter::<S>))
        .route("/stats", get(pages::stats::<S>))
        .route("/api/tasks", get(api::list_tasks::<S>).post(api::create_task::<S>))
        .route(
            "/api/tasks/:id",
            get(api::get_task::<S>).delete(api::delete_task::<S>),
        )
        .route("/api/tasks/:id/complete", put(api::complete_task::<S>))
        .route("/api/stats", get(api::stats::<S>))
        .route("/health", get(api::health::<S>))
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}
