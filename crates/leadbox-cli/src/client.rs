//! HTTP clients for the Leadbox API.
//!
//! [`SubmissionClient`] posts a contact form to the intake endpoint and
//! turns the response into a confirmation or a [`ClientError`].
//! [`AdminClient`] talks to the admin API with the credential held by an
//! [`AdminSession`].

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use leadbox_core::form::ContactForm;
use leadbox_core::submission::{
    ContactFields, ContactReceipt, DEFAULT_CONFIRMATION, ListQuery, RequestPage, Stats,
    StatusUpdate, Submission,
};
use leadbox_core::validate::FieldErrors;

use crate::error::{ClientError, GENERIC_REJECTION};
use crate::session::AdminSession;

/// Timeout applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error body the server sends with non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    fields: FieldErrors,
}

fn http_client(timeout: Duration) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ClientError::Setup)
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}{path}", base.trim_end_matches('/'))
}

fn rejection(status: StatusCode, body: &str) -> ClientError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    ClientError::Rejected {
        status: status.as_u16(),
        detail: parsed
            .detail
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| GENERIC_REJECTION.to_owned()),
        fields: parsed.fields,
    }
}

/// Sends contact forms to `POST /api/contact`.
#[derive(Debug, Clone)]
pub struct SubmissionClient {
    http: reqwest::Client,
    base: String,
}

impl SubmissionClient {
    /// # Errors
    ///
    /// Returns [`ClientError::Setup`] if the HTTP client cannot be built.
    pub fn new(base: &str, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            http: http_client(timeout)?,
            base: base.to_owned(),
        })
    }

    /// Validate and submit `form`.
    ///
    /// The form is cleared only when the server confirms; on every other
    /// outcome the values stay and the in-flight flag is reset.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Invalid`] or [`ClientError::InFlight`] without any
    ///   network call.
    /// - [`ClientError::Rejected`] for a non-2xx response or `success: false`.
    /// - [`ClientError::MalformedResponse`] for a 2xx body without `success`.
    /// - [`ClientError::Network`] when no response arrived.
    pub async fn submit(&self, form: &mut ContactForm) -> Result<String, ClientError> {
        let payload = form.begin_submit()?;
        let outcome = self.send(&payload).await;
        form.finish_submit(outcome.is_ok());
        outcome
    }

    async fn send(&self, payload: &ContactFields) -> Result<String, ClientError> {
        let resp = self
            .http
            .post(endpoint(&self.base, "/api/contact"))
            .json(payload)
            .send()
            .await
            .map_err(ClientError::Network)?;

        let status = resp.status();
        let body = resp.text().await.map_err(ClientError::Network)?;

        if !status.is_success() {
            return Err(rejection(status, &body));
        }

        let receipt: ContactReceipt = serde_json::from_str(&body)
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;

        if !receipt.success {
            let detail = if receipt.message.trim().is_empty() {
                GENERIC_REJECTION.to_owned()
            } else {
                receipt.message
            };
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                detail,
                fields: FieldErrors::new(),
            });
        }

        if receipt.message.trim().is_empty() {
            Ok(DEFAULT_CONFIRMATION.to_owned())
        } else {
            Ok(receipt.message)
        }
    }
}

/// Admin API client. Every call carries the session's credential.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    base: String,
    session: AdminSession,
}

impl AdminClient {
    /// # Errors
    ///
    /// Returns [`ClientError::Setup`] if the HTTP client cannot be built.
    pub fn new(base: &str, session: AdminSession, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            http: http_client(timeout)?,
            base: base.to_owned(),
            session,
        })
    }

    /// Request counts per status.
    ///
    /// # Errors
    ///
    /// See [`ClientError`]; `Auth` when the credential is refused.
    pub async fn stats(&self) -> Result<Stats, ClientError> {
        self.call(self.http.get(endpoint(&self.base, "/api/admin/stats")), None)
            .await
    }

    /// One page of requests.
    ///
    /// # Errors
    ///
    /// See [`ClientError`].
    pub async fn list(&self, query: &ListQuery) -> Result<RequestPage, ClientError> {
        let path = format!("/api/admin/requests?{}", query_string(query));
        self.call(self.http.get(endpoint(&self.base, &path)), None)
            .await
    }

    /// A single request.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotFound`] for an unknown id.
    pub async fn get(&self, id: &str) -> Result<Submission, ClientError> {
        let path = format!("/api/admin/requests/{}", urlencoding::encode(id));
        self.call(self.http.get(endpoint(&self.base, &path)), Some(id))
            .await
    }

    /// Change a request's status and, optionally, its notes.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotFound`] for an unknown id.
    pub async fn update(
        &self,
        id: &str,
        update: &StatusUpdate,
    ) -> Result<Submission, ClientError> {
        let path = format!("/api/admin/requests/{}", urlencoding::encode(id));
        self.call(
            self.http.put(endpoint(&self.base, &path)).json(update),
            Some(id),
        )
        .await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        id: Option<&str>,
    ) -> Result<T, ClientError> {
        let authorization = self.session.authorization()?;
        let resp = request
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(ClientError::Network)?;

        let status = resp.status();
        let body = resp.text().await.map_err(ClientError::Network)?;

        match (status, id) {
            (StatusCode::UNAUTHORIZED, _) => Err(ClientError::Auth),
            (StatusCode::NOT_FOUND, Some(id)) => Err(ClientError::NotFound { id: id.to_owned() }),
            (s, _) if !s.is_success() => Err(rejection(s, &body)),
            _ => serde_json::from_str(&body)
                .map_err(|e| ClientError::MalformedResponse(e.to_string())),
        }
    }
}

fn query_string(query: &ListQuery) -> String {
    let mut params = vec![
        format!("page={}", query.page),
        format!("limit={}", query.limit),
    ];
    if let Some(status) = query.status {
        params.push(format!("status={status}"));
    }
    if let Some(search) = &query.search {
        params.push(format!("q={}", urlencoding::encode(search)));
    }
    if let Some(from) = query.created_from {
        params.push(format!(
            "created_from={}",
            urlencoding::encode(&from.to_rfc3339())
        ));
    }
    if let Some(to) = query.created_to {
        params.push(format!(
            "created_to={}",
            urlencoding::encode(&to.to_rfc3339())
        ));
    }
    params.join("&")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::http::StatusCode as HttpStatus;
    use axum::routing::post;
    use leadbox_core::auth::{Credentials, SharedSecretAuthenticator};
    use leadbox_core::submission::{Service, Status};
    use leadbox_core::validate::Field;
    use leadbox_server::app::{RouterOptions, build_router};
    use leadbox_server::state::AppState;
    use leadbox_storage::MemoryBackend;
    use tokio::net::TcpListener;

    use super::*;

    /// Serve `app` on an ephemeral port and return its base URL.
    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn spawn_leadbox() -> String {
        let state = Arc::new(AppState::new(
            Arc::new(MemoryBackend::new()),
            Arc::new(SharedSecretAuthenticator::new("admin", "pw")),
        ));
        serve(build_router(
            state,
            &RouterOptions {
                cors_origins: Vec::new(),
                request_timeout: Duration::from_secs(5),
            },
        ))
        .await
    }

    /// A server whose intake always answers with `status` and `body`.
    async fn canned_server(status: HttpStatus, body: &'static str) -> String {
        let app = Router::new().route(
            "/api/contact",
            post(move || async move {
                (
                    status,
                    [(axum::http::header::CONTENT_TYPE, "application/json")],
                    body,
                )
            }),
        );
        serve(app).await
    }

    fn filled_form() -> ContactForm {
        let mut form = ContactForm::new();
        form.set_name("Aziza");
        form.set_email("aziza@example.uz");
        form.set_phone("901234567");
        form.blur_phone();
        form.set_message("Need a website");
        form.set_service(Some(Service::Websites));
        form
    }

    fn admin(base: &str) -> AdminClient {
        AdminClient::new(
            base,
            AdminSession::with_credentials(&Credentials::new("admin", "pw")),
            DEFAULT_TIMEOUT,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn submit_clears_form_on_success() {
        let base = spawn_leadbox().await;
        let client = SubmissionClient::new(&base, DEFAULT_TIMEOUT).unwrap();
        let mut form = filled_form();

        let message = client.submit(&mut form).await.unwrap();
        assert_eq!(message, DEFAULT_CONFIRMATION);
        assert_eq!(form.fields(), &ContactFields::default());
        assert!(!form.is_submitting());

        let page = admin(&base).list(&ListQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.requests[0].phone, "+998 90 123 45 67");
        assert_eq!(page.requests[0].status, Status::New);
    }

    #[tokio::test]
    async fn invalid_form_is_not_sent() {
        // Nothing listens here; a network call would fail differently.
        let client = SubmissionClient::new("http://127.0.0.1:9", DEFAULT_TIMEOUT).unwrap();
        let mut form = filled_form();
        form.set_message("");

        let err = client.submit(&mut form).await.unwrap_err();
        let ClientError::Invalid(errors) = err else {
            unreachable!("expected local validation failure, got {err:?}");
        };
        assert!(errors.contains(Field::Message));
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn network_failure_keeps_values() {
        let client = SubmissionClient::new("http://127.0.0.1:9", DEFAULT_TIMEOUT).unwrap();
        let mut form = filled_form();

        let err = client.submit(&mut form).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
        assert!(err.to_string().contains("contact us by phone"));
        assert_eq!(form.fields().name, "Aziza");
        assert!(!form.is_submitting());
    }

    #[tokio::test]
    async fn configured_timeout_applies() {
        let app = Router::new().route(
            "/api/contact",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let base = serve(app).await;
        let client = SubmissionClient::new(&base, Duration::from_millis(100)).unwrap();
        let mut form = filled_form();

        let err = client.submit(&mut form).await.unwrap_err();
        let ClientError::Network(source) = &err else {
            unreachable!("expected a timeout, got {err:?}");
        };
        assert!(source.is_timeout());
        assert_eq!(form.fields().name, "Aziza");
    }

    #[tokio::test]
    async fn server_detail_is_surfaced() {
        let base = canned_server(
            HttpStatus::UNPROCESSABLE_ENTITY,
            r#"{"error":"validation_failed","detail":"Invalid email format","fields":{"email":"Invalid email format"}}"#,
        )
        .await;
        let mut form = filled_form();

        let err = SubmissionClient::new(&base, DEFAULT_TIMEOUT).unwrap()
            .submit(&mut form)
            .await
            .unwrap_err();
        let ClientError::Rejected {
            status,
            detail,
            fields,
        } = err
        else {
            unreachable!("expected rejection");
        };
        assert_eq!(status, 422);
        assert_eq!(detail, "Invalid email format");
        assert!(fields.contains(Field::Email));
        assert_eq!(form.fields().name, "Aziza");
    }

    #[tokio::test]
    async fn error_without_detail_uses_generic_message() {
        let base = canned_server(HttpStatus::INTERNAL_SERVER_ERROR, "oops").await;
        let err = SubmissionClient::new(&base, DEFAULT_TIMEOUT).unwrap()
            .submit(&mut filled_form())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), GENERIC_REJECTION);
    }

    #[tokio::test]
    async fn success_false_is_a_rejection() {
        let base =
            canned_server(HttpStatus::OK, r#"{"success":false,"message":"Spam detected"}"#).await;
        let mut form = filled_form();
        let err = SubmissionClient::new(&base, DEFAULT_TIMEOUT).unwrap()
            .submit(&mut form)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Spam detected");
        assert_eq!(form.fields().name, "Aziza");
    }

    #[tokio::test]
    async fn missing_success_flag_is_malformed() {
        let base = canned_server(HttpStatus::OK, r#"{"message":"ok"}"#).await;
        let mut form = filled_form();
        let err = SubmissionClient::new(&base, DEFAULT_TIMEOUT).unwrap()
            .submit(&mut form)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)));
        assert_eq!(form.fields().name, "Aziza");
    }

    #[tokio::test]
    async fn empty_success_message_uses_default() {
        let base = canned_server(HttpStatus::OK, r#"{"success":true,"message":""}"#).await;
        let message = SubmissionClient::new(&base, DEFAULT_TIMEOUT).unwrap()
            .submit(&mut filled_form())
            .await
            .unwrap();
        assert_eq!(message, DEFAULT_CONFIRMATION);
    }

    #[tokio::test]
    async fn admin_workflow() {
        let base = spawn_leadbox().await;
        SubmissionClient::new(&base, DEFAULT_TIMEOUT).unwrap()
            .submit(&mut filled_form())
            .await
            .unwrap();

        let admin = admin(&base);
        let stats = admin.stats().await.unwrap();
        assert_eq!(stats.new_requests, 1);

        let page = admin
            .list(&ListQuery {
                search: Some("+998 90".to_owned()),
                ..ListQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        let id = page.requests[0].id.clone();

        let updated = admin
            .update(
                &id,
                &StatusUpdate {
                    status: Status::Processed,
                    admin_notes: Some("called back".to_owned()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, Status::Processed);
        assert_eq!(admin.get(&id).await.unwrap(), updated);

        let processed = admin
            .list(&ListQuery {
                status: Some(Status::Processed),
                ..ListQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(processed.total, 1);
    }

    #[tokio::test]
    async fn admin_errors_are_classified() {
        let base = spawn_leadbox().await;

        let err = admin(&base).get("missing").await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound { id } if id == "missing"));

        let wrong = AdminClient::new(
            &base,
            AdminSession::with_credentials(&Credentials::new("admin", "nope")),
            DEFAULT_TIMEOUT,
        )
        .unwrap();
        assert!(matches!(wrong.stats().await, Err(ClientError::Auth)));

        let logged_out =
            AdminClient::new(&base, AdminSession::default(), DEFAULT_TIMEOUT).unwrap();
        assert!(matches!(
            logged_out.stats().await,
            Err(ClientError::NotLoggedIn)
        ));
    }

    #[test]
    fn query_string_encodes_filters() {
        let query = ListQuery {
            page: 2,
            limit: 5,
            status: Some(Status::Closed),
            search: Some("a b&c".to_owned()),
            ..ListQuery::default()
        };
        assert_eq!(
            query_string(&query),
            "page=2&limit=5&status=closed&q=a%20b%26c"
        );
    }
}
