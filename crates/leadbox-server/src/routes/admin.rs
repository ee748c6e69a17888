//! Admin routes: `/api/admin/*`
//!
//! Request listing, per-status counts, and status updates. Every route here
//! sits behind the admin authentication middleware.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use leadbox_core::auth::AdminIdentity;
use leadbox_core::submission::{
    DEFAULT_PAGE_SIZE, ListQuery, RequestPage, Stats, Status, StatusUpdate, Submission,
};
use leadbox_core::validate::validate_notes;

use crate::error::AppError;
use crate::state::AppState;

/// Build the admin router. The caller applies the auth middleware.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/stats", get(stats))
        .route("/api/admin/requests", get(list_requests))
        .route(
            "/api/admin/requests/{id}",
            get(get_request).put(update_request),
        )
}

// ── Request / Response types ─────────────────────────────────────────

/// Query string of `GET /api/admin/requests`.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// A status name, or `all`.
    pub status: Option<String>,
    /// Free-text search over name, email and phone.
    pub q: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl TryFrom<ListParams> for ListQuery {
    type Error = AppError;

    fn try_from(params: ListParams) -> Result<Self, Self::Error> {
        let status = match params.status.as_deref().map(str::trim) {
            None | Some("" | "all") => None,
            Some(raw) => Some(
                raw.parse::<Status>()
                    .map_err(|e| AppError::BadRequest(e.to_string()))?,
            ),
        };

        if let (Some(from), Some(to)) = (params.created_from, params.created_to) {
            if from > to {
                return Err(AppError::BadRequest(
                    "created_from must not be after created_to".to_owned(),
                ));
            }
        }

        Ok(Self {
            page: params.page.unwrap_or(1),
            limit: params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            status,
            search: params.q,
            created_from: params.created_from,
            created_to: params.created_to,
        }
        .normalized())
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

/// Request counts per status.
async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<Stats>, AppError> {
    Ok(Json(state.store.stats().await?))
}

/// One page of requests, newest first.
async fn list_requests(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<RequestPage>, AppError> {
    let Query(params) = params?;
    let query = ListQuery::try_from(params)?;
    Ok(Json(state.store.list(query).await?))
}

/// A single request by id.
async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Submission>, AppError> {
    Ok(Json(state.store.get(&id).await?))
}

/// Change a request's status and, optionally, its notes.
async fn update_request(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminIdentity>,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<Submission>, AppError> {
    let Json(update) = payload?;
    if let Some(notes) = &update.admin_notes {
        validate_notes(notes)?;
    }

    let updated = state.store.update(&id, update).await?;
    info!(admin = %admin.username, request_id = %id, status = %updated.status, "admin updated request");

    Ok(Json(updated))
}
