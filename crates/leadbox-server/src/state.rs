//! Shared application state for Leadbox server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`. It holds the request store and the admin
//! authenticator.

use std::sync::Arc;

use tracing::warn;

use leadbox_core::auth::{AdminAuthenticator, DenyAllAuthenticator, SharedSecretAuthenticator};
use leadbox_core::store::RequestStore;
use leadbox_storage::StorageBackend;

use crate::config::ServerConfig;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Persisted contact requests.
    pub store: Arc<RequestStore>,
    /// Admin credential check.
    pub authenticator: Arc<dyn AdminAuthenticator>,
}

impl AppState {
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        authenticator: Arc<dyn AdminAuthenticator>,
    ) -> Self {
        Self {
            store: Arc::new(RequestStore::new(storage)),
            authenticator,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

/// Pick the admin authenticator for this configuration.
///
/// Without a configured password every admin request is refused.
#[must_use]
pub fn admin_authenticator(config: &ServerConfig) -> Arc<dyn AdminAuthenticator> {
    match &config.admin_password {
        Some(password) => Arc::new(SharedSecretAuthenticator::new(
            &config.admin_username,
            password,
        )),
        None => {
            warn!("LEADBOX_ADMIN_PASSWORD is not set, admin access is disabled");
            Arc::new(DenyAllAuthenticator)
        }
    }
}
