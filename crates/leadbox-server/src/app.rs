//! Router assembly.
//!
//! Public intake and health routes, the admin routes behind the auth
//! middleware, and the cross-cutting layers every response goes through.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, Uri, header};
use axum::middleware as axum_mw;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::{MAX_BODY_BYTES, ServerConfig};
use crate::error::AppError;
use crate::middleware::{admin_auth_middleware, json_error_bodies};
use crate::routes;
use crate::state::AppState;

/// Concurrent requests allowed on the public intake route.
const INTAKE_CONCURRENCY: usize = 64;

/// HTTP settings that shape the router.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Origins allowed to call the API from a browser.
    pub cors_origins: Vec<String>,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl From<&ServerConfig> for RouterOptions {
    fn from(config: &ServerConfig) -> Self {
        Self {
            cors_origins: config.cors_origins.clone(),
            request_timeout: config.request_timeout,
        }
    }
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: Arc<AppState>, options: &RouterOptions) -> Router {
    let admin_routes = routes::admin::router().route_layer(axum_mw::from_fn_with_state(
        Arc::clone(&state),
        admin_auth_middleware,
    ));

    let intake_routes = routes::contact::router()
        .layer(tower::limit::ConcurrencyLimitLayer::new(INTAKE_CONCURRENCY));

    Router::new()
        .merge(intake_routes)
        .merge(admin_routes)
        .merge(routes::health::router())
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            options.request_timeout,
        ))
        .layer(axum_mw::map_response(json_error_bodies))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&options.cors_origins))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use leadbox_core::auth::DenyAllAuthenticator;
    use leadbox_storage::MemoryBackend;
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        let state = Arc::new(AppState::new(
            Arc::new(MemoryBackend::new()),
            Arc::new(DenyAllAuthenticator),
        ));
        build_router(
            state,
            &RouterOptions {
                cors_origins: vec!["https://agency.uz".to_owned()],
                request_timeout: Duration::from_secs(5),
            },
        )
    }

    #[tokio::test]
    async fn security_headers_on_every_response() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let response = app()
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
    }

    #[tokio::test]
    async fn preflight_allows_configured_origin() {
        let response = app()
            .oneshot(
                Request::options("/api/contact")
                    .header(header::ORIGIN, "https://agency.uz")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://agency.uz"
        );
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let body = "x".repeat(MAX_BODY_BYTES + 1);
        let response = app()
            .oneshot(
                Request::post("/api/contact")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::CONTENT_LENGTH, body.len())
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "payload_too_large");
    }

    #[tokio::test]
    async fn timeout_is_rendered_as_json() {
        let app = Router::new()
            .route(
                "/slow",
                axum::routing::get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_millis(20),
            ))
            .layer(axum_mw::map_response(json_error_bodies));

        let response = app
            .oneshot(Request::get("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "timeout");
    }
}
