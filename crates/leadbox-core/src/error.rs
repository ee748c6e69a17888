//! Error types for `leadbox-core`.
//!
//! Variants carry the id or reason involved. Authentication errors never
//! include the supplied credentials.

use leadbox_storage::StorageError;

/// Errors from the request store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No request with this id exists.
    #[error("request '{id}' not found")]
    NotFound { id: String },

    /// A stored record could not be encoded or decoded.
    #[error("request serialization failed: {reason}")]
    Serialization { reason: String },

    /// The storage backend failed.
    #[error("request storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors from admin authentication.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The request carried no `Authorization` header.
    #[error("missing admin credentials")]
    MissingCredentials,

    /// The header was present but not valid Basic credentials.
    #[error("malformed admin credentials: {reason}")]
    Malformed { reason: String },

    /// Username or password did not match.
    #[error("invalid admin credentials")]
    InvalidCredentials,

    /// No admin credential is configured, so nobody can sign in.
    #[error("admin access is disabled")]
    Disabled,
}
