//! Notification dispatch and history routes.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use courier_common::error::AppError;
use courier_common::types::DeliveryRecord;
use courier_dispatch::{BroadcastOutcome, BulkOutcome, SendOutcome};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/notifications/send", post(send))
        .route("/api/notifications/send-bulk", post(send_bulk))
        .route("/api/notifications/send-all", post(send_all))
        .route("/api/notifications/history", get(history))
}

/// Request body for a single-recipient send.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub recipient_id: Uuid,
    pub title: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
}

/// Request body for a bulk send to an explicit recipient set.
#[derive(Debug, Deserialize)]
pub struct SendBulkRequest {
    pub recipient_ids: Vec<Uuid>,
    pub title: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
}

/// Request body for a broadcast to all recipients.
#[derive(Debug, Deserialize)]
pub struct SendAllRequest {
    pub title: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
}

/// Reject blank titles and bodies before any side effect.
fn validate_text(title: &str, body: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if body.trim().is_empty() {
        return Err(AppError::Validation("body is required".to_string()));
    }
    Ok(())
}

/// POST /api/notifications/send — Notify one recipient and record the outcome.
async fn send(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<SendRequest>,
) -> Result<Json<SendOutcome>, AppError> {
    validate_text(&req.title, &req.body)?;

    let outcome = state
        .dispatcher
        .send_to_recipient(req.recipient_id, &req.title, &req.body, req.data)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/notifications/send-bulk — Notify an explicit recipient set.
async fn send_bulk(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<SendBulkRequest>,
) -> Result<Json<BulkOutcome>, AppError> {
    validate_text(&req.title, &req.body)?;
    if req.recipient_ids.is_empty() {
        return Err(AppError::Validation(
            "recipient_ids must not be empty".to_string(),
        ));
    }

    let outcome = state
        .dispatcher
        .send_bulk(&req.recipient_ids, &req.title, &req.body, req.data)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/notifications/send-all — Broadcast to every recipient with a
/// valid push token. Reports a count only; broadcasts are not recorded.
async fn send_all(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<SendAllRequest>,
) -> Result<Json<BroadcastOutcome>, AppError> {
    validate_text(&req.title, &req.body)?;

    let outcome = state
        .dispatcher
        .send_broadcast(&req.title, &req.body, req.data)
        .await?;
    Ok(Json(outcome))
}

/// GET /api/notifications/history — The caller's delivery records,
/// newest first, capped at one page.
async fn history(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<DeliveryRecord>>, AppError> {
    let records = state.dispatcher.history(auth.recipient_id).await?;
    Ok(Json(records))
}
