//! Request middleware for Leadbox.
//!
//! [`admin_auth_middleware`] checks the `Authorization` header with the
//! configured [`AdminAuthenticator`](leadbox_core::auth::AdminAuthenticator)
//! and injects the [`AdminIdentity`] for downstream handlers. It is applied
//! only to the admin routes.
//!
//! [`json_error_bodies`] wraps the whole router so error statuses produced by
//! layers (body limit, timeout, method routing) carry the same JSON body as
//! handler errors.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{self, AUTHORIZATION};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use leadbox_core::auth::AdminIdentity;

use crate::error::AppError;
use crate::state::AppState;

/// Middleware that rejects requests without valid admin credentials.
///
/// Every failure produces the same 401 response; the reason is only logged.
pub async fn admin_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let authorization = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    match state
        .authenticator
        .authenticate(authorization.as_deref())
        .await
    {
        Ok(identity) => {
            req.extensions_mut().insert::<AdminIdentity>(identity);
            next.run(req).await
        }
        Err(err) => {
            warn!(path = %req.uri().path(), reason = %err, "admin authentication failed");
            AppError::from(err).into_response()
        }
    }
}

/// Headers of the original error response kept on the JSON replacement.
const KEPT_HEADERS: [header::HeaderName; 2] = [header::ALLOW, header::RETRY_AFTER];

/// Replace a non-JSON 4xx/5xx response with the [`AppError`] body for its
/// status.
pub async fn json_error_bodies(response: Response) -> Response {
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));
    if is_json {
        return response;
    }

    let mut rebuilt = AppError::from_status(status).into_response();
    for name in KEPT_HEADERS {
        if let Some(value) = response.headers().get(&name) {
            rebuilt.headers_mut().insert(name, value.clone());
        }
    }
    rebuilt
}
