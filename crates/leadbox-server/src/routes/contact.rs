//! Public intake route: `POST /api/contact`
//!
//! Validates the submission again on the server, then stores it with
//! status `new`. Client-side validation is never trusted.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use leadbox_core::submission::{ContactFields, ContactReceipt, DEFAULT_CONFIRMATION};
use leadbox_core::validate::validate_for_intake;

use crate::error::AppError;
use crate::state::AppState;

/// Build the intake router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/contact", post(submit_contact))
}

/// Accept a contact request.
async fn submit_contact(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ContactFields>, JsonRejection>,
) -> Result<(StatusCode, Json<ContactReceipt>), AppError> {
    let Json(fields) = payload?;

    let contact = validate_for_intake(&fields).map_err(|errors| {
        let failed: Vec<&str> = errors.iter().map(|(field, _)| field.as_str()).collect();
        info!(fields = ?failed, "contact request rejected");
        AppError::Validation(errors)
    })?;

    let submission = state.store.create(contact).await?;

    Ok((
        StatusCode::CREATED,
        Json(ContactReceipt {
            success: true,
            message: DEFAULT_CONFIRMATION.to_owned(),
            id: Some(submission.id),
        }),
    ))
}
