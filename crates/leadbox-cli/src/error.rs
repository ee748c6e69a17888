//! Error types for the Leadbox client.

use leadbox_core::form::SubmitBlocked;
use leadbox_core::validate::FieldErrors;

/// Shown when the server refused a submission without saying why.
pub const GENERIC_REJECTION: &str = "Failed to send the request";

/// Shown when the server could not be reached at all.
pub const NETWORK_FAILURE: &str =
    "Could not send the request. Please try again or contact us by phone.";

/// All errors the client can surface.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The form failed local validation; nothing was sent.
    #[error("some fields need attention: {0}")]
    Invalid(FieldErrors),

    /// A submit from this form is still running.
    #[error("a submission is already in progress")]
    InFlight,

    /// The server answered but refused the request.
    #[error("{detail}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message from the server, or [`GENERIC_REJECTION`].
        detail: String,
        /// Per-field messages, when the server reported any.
        fields: FieldErrors,
    },

    /// The HTTP client could not be built (TLS backend or resolver setup).
    #[error("could not set up the HTTP client")]
    Setup(#[source] reqwest::Error),

    /// No response: connection refused, DNS failure, or timeout.
    #[error("{}", NETWORK_FAILURE)]
    Network(#[source] reqwest::Error),

    /// A success status with a body that is not what the server sends.
    #[error("unexpected response from server: {0}")]
    MalformedResponse(String),

    /// Admin credentials were refused (401).
    #[error("admin authentication failed, run `leadbox admin login` again")]
    Auth,

    /// No request with this id (404).
    #[error("request '{id}' not found")]
    NotFound { id: String },

    /// An admin command ran without a stored session.
    #[error("not logged in, run `leadbox admin login` first")]
    NotLoggedIn,

    /// The session file could not be read or written.
    #[error("session file error: {0}")]
    Session(String),
}

impl From<SubmitBlocked> for ClientError {
    fn from(blocked: SubmitBlocked) -> Self {
        match blocked {
            SubmitBlocked::InFlight => Self::InFlight,
            SubmitBlocked::Invalid(errors) => Self::Invalid(errors),
        }
    }
}
