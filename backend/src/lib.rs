//! Task board web application: HTML pages and a JSON API over a pluggable
//! task store.

pub mod config;
pub mod error;
pub mod routes;
pub mod store;
pub mod views;

pub use routes::build_router;
