//! Runtime configuration read from the environment.
//!
//! - `HOST` (default `0.0.0.0`), `PORT` (default `5000`)
//! - `STORAGE_MODE`: `memory` (default) | `sqlite` | `redis`
//! - `DATABASE_URL` (default `sqlite://tasks.db`)
//! - `REDIS_URL` (default `redis://127.0.0.1:6379`)
//! - `STATIC_DIR` (default `backend/static`)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DATABASE_URL: &str = "sqlite://tasks.db";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_STATIC_DIR: &str = "backend/static";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name}='{value}' is not valid: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    #[default]
    Memory,
    Sqlite,
    Redis,
}

impl FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "memory" | "in_memory" => Ok(StorageMode::Memory),
            "sqlite" | "database" => Ok(StorageMode::Sqlite),
            "redis" => Ok(StorageMode::Redis),
            other => Err(format!("unknown storage mode `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub storage: StorageMode,
    pub database_url: String,
    pub redis_url: String,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; tests pass a map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = parse_var(&lookup, "HOST", DEFAULT_HOST)?;
        let port = parse_var(&lookup, "PORT", &DEFAULT_PORT.to_string())?;
        let storage = parse_var(&lookup, "STORAGE_MODE", "memory")?;
        Ok(Self {
            host,
            port,
            storage,
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            redis_url: lookup("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    let value = lookup(name).unwrap_or_else(|| default.to_string());
    value.trim().parse().map_err(|err: T::Err| ConfigError::Invalid {
        name,
        value: value.clone(),
        reason: err.to_string(),
    })
}
