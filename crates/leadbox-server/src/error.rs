//! HTTP error types for Leadbox server.
//!
//! Maps domain errors from `leadbox-core` into appropriate HTTP responses.
//! Every error variant produces a JSON body with a machine-readable `error`
//! field and a human-readable `detail`.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use leadbox_core::error::{AuthError, StoreError};
use leadbox_core::validate::FieldErrors;

/// Value of the `WWW-Authenticate` header sent with every 401.
pub const WWW_AUTHENTICATE: &str = r#"Basic realm="leadbox-admin""#;

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Admin credentials missing, malformed, or wrong. Always rendered the
    /// same way.
    Unauthorized,
    /// Requested resource not found.
    NotFound(String),
    /// Client sent a body or query that could not be parsed.
    BadRequest(String),
    /// Fields failed validation.
    Validation(FieldErrors),
    /// Request body exceeded the configured limit.
    PayloadTooLarge,
    /// The route exists but not for this method.
    MethodNotAllowed,
    /// The handler did not finish within the request timeout.
    Timeout,
    /// Internal server error. The cause is logged, never returned.
    Internal(String),
    /// Any other error status produced outside a handler.
    Status(StatusCode),
}

impl AppError {
    /// The error matching a bare status code produced by a layer or by the
    /// router itself.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::NOT_FOUND => Self::NotFound("not found".to_owned()),
            StatusCode::METHOD_NOT_ALLOWED => Self::MethodNotAllowed,
            StatusCode::REQUEST_TIMEOUT => Self::Timeout,
            StatusCode::PAYLOAD_TOO_LARGE => Self::PayloadTooLarge,
            other => Self::Status(other),
        }
    }
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, detail, fields) = match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "valid admin credentials are required".to_owned(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            Self::Validation(fields) => {
                let detail = fields
                    .first()
                    .map_or_else(|| "invalid input".to_owned(), |(_, msg)| msg.to_owned());
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "validation_failed",
                    detail,
                    Some(fields),
                )
            }
            Self::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "payload_too_large",
                "request body is too large".to_owned(),
                None,
            ),
            Self::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "method_not_allowed",
                "method not allowed for this route".to_owned(),
                None,
            ),
            Self::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                "timeout",
                "request took too long".to_owned(),
                None,
            ),
            Self::Status(status) if status.is_server_error() => {
                error!(%status, "error status produced outside a handler");
                (
                    status,
                    "internal_error",
                    "internal server error".to_owned(),
                    None,
                )
            }
            Self::Status(status) => (
                status,
                "request_failed",
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_lowercase(),
                None,
            ),
            Self::Internal(cause) => {
                error!(error = %cause, "internal error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_owned(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            error: error_type,
            detail,
            fields,
        };

        let mut response = (status, axum::Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(WWW_AUTHENTICATE),
            );
        }
        response
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::Serialization { .. } | StoreError::Storage(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(_: AuthError) -> Self {
        Self::Unauthorized
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::PayloadTooLarge;
        }
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
