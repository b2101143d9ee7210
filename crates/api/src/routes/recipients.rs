//! Recipient profile and push-token registration routes.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use courier_common::error::AppError;
use courier_common::types::Recipient;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/recipients/me", get(me))
        .route("/api/recipients/push-token", post(register_push_token))
}

/// Request body for push-token registration.
#[derive(Debug, Deserialize)]
pub struct RegisterPushTokenRequest {
    pub push_token: String,
}

/// GET /api/recipients/me — The authenticated recipient's profile.
async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Recipient>, AppError> {
    let recipient = state
        .recipients
        .get_by_id(auth.recipient_id)
        .await?
        .ok_or(AppError::RecipientNotFound(auth.recipient_id))?;
    Ok(Json(recipient))
}

/// POST /api/recipients/push-token — Register or replace the caller's
/// push token. The token must match the gateway's grammar before it is
/// stored; a token that would never deliver is rejected here instead of
/// failing every later dispatch.
async fn register_push_token(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<RegisterPushTokenRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if req.push_token.trim().is_empty() {
        return Err(AppError::Validation("push_token is required".to_string()));
    }
    if !state.gateway.is_valid_endpoint(&req.push_token) {
        return Err(AppError::Validation(
            "push_token does not match the gateway token format".to_string(),
        ));
    }

    state
        .recipients
        .set_push_token(auth.recipient_id, &req.push_token)
        .await?;

    Ok(Json(json!({ "registered": true })))
}
