use std::error::Error;
use std::path::Path;

use axum::Router;
use taskboard::build_router;
use taskboard::config::{Config, StorageMode};
use taskboard::store::{MemoryTaskStore, RedisTaskStore, SqliteTaskStore};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("taskboard=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let app = app_for(&config).await?;

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!(
        addr = %listener.local_addr()?,
        storage = ?config.storage,
        "task board listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn app_for(config: &Config) -> Result<Router, Box<dyn Error>> {
    let static_dir: &Path = &config.static_dir;
    let app = match config.storage {
        StorageMode::Memory => build_router(MemoryTaskStore::new(), static_dir),
        StorageMode::Sqlite => {
            info!(url = %config.database_url, "opening sqlite database");
            build_router(SqliteTaskStore::connect(&config.database_url).await?, static_dir)
        }
        StorageMode::Redis => {
            info!(url = %config.redis_url, "using redis");
            build_router(RedisTaskStore::open(&config.redis_url)?, static_dir)
        }
    };
    Ok(app)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
