//! Server configuration for Leadbox.
//!
//! Loads configuration from environment variables with sensible defaults.
//! All settings can be overridden via `LEADBOX_*` environment variables.

use std::net::SocketAddr;
use std::time::Duration;

/// Port used when neither `LEADBOX_BIND_ADDR` nor `PORT` is usable.
const DEFAULT_PORT: u16 = 8000;

/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Largest request body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Storage backend type.
    pub storage_backend: StorageBackendType,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Admin username.
    pub admin_username: String,
    /// Admin password. `None` disables the admin area.
    pub admin_password: Option<String>,
    /// Origins allowed to call the API from a browser.
    pub cors_origins: Vec<String>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

/// Supported storage backend types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory (development only, data lost on restart).
    Memory,
    /// Redb persistent storage.
    Redb { path: String },
    /// `RocksDB` persistent storage.
    RocksDb { path: String },
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT`: port to bind on `0.0.0.0` (platform convention)
    /// - `LEADBOX_BIND_ADDR`: full bind address (overrides `PORT`, default: `127.0.0.1:8000`)
    /// - `LEADBOX_STORAGE`: `memory`, `redb`, or `rocksdb` (default: `memory`)
    /// - `LEADBOX_STORAGE_PATH`: path for persistent backends (default: `./data`)
    /// - `LEADBOX_LOG_LEVEL`: log filter (default: `info`)
    /// - `LEADBOX_ADMIN_USER`: admin username (default: `admin`)
    /// - `LEADBOX_ADMIN_PASSWORD`: admin password (unset disables admin access)
    /// - `LEADBOX_CORS_ORIGINS`: comma-separated origins (default: `http://localhost:3000`)
    /// - `LEADBOX_REQUEST_TIMEOUT_SECS`: per-request timeout (default: `30`)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let default_addr = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT));

        // Priority: LEADBOX_BIND_ADDR > PORT > default.
        let bind_addr = if let Some(addr) = var("LEADBOX_BIND_ADDR") {
            addr.parse().unwrap_or(default_addr)
        } else if let Some(port) = var("PORT") {
            let port: u16 = port.parse().unwrap_or(DEFAULT_PORT);
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            default_addr
        };

        let storage_path = var("LEADBOX_STORAGE_PATH").unwrap_or_else(|| "./data".to_owned());

        let storage_backend = match var("LEADBOX_STORAGE")
            .unwrap_or_else(|| "memory".to_owned())
            .to_lowercase()
            .as_str()
        {
            "redb" => StorageBackendType::Redb { path: storage_path },
            "rocksdb" => StorageBackendType::RocksDb { path: storage_path },
            _ => StorageBackendType::Memory,
        };

        let log_level = var("LEADBOX_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        let admin_username = var("LEADBOX_ADMIN_USER")
            .map(|u| u.trim().to_owned())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| "admin".to_owned());

        let admin_password = var("LEADBOX_ADMIN_PASSWORD").filter(|p| !p.is_empty());

        let cors_origins = var("LEADBOX_CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_owned())
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_owned)
            .collect();

        let request_timeout = Duration::from_secs(
            var("LEADBOX_REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|&secs| secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );

        Self {
            bind_addr,
            storage_backend,
            log_level,
            admin_username,
            admin_password,
            cors_origins,
            request_timeout,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("storage_backend", &self.storage_backend)
            .field("log_level", &self.log_level)
            .field("admin_username", &self.admin_username)
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("cors_origins", &self.cors_origins)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
