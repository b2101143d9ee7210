use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Common error types used across the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Recipient {0} not found")]
    RecipientNotFound(Uuid),

    #[error("Recipient {0} has no registered push token")]
    NoEndpoint(Uuid),

    #[error("Recipient {0} has a malformed push token")]
    InvalidEndpoint(Uuid),

    #[error("No recipients with a valid push token")]
    NoValidRecipients,

    #[error("Gateway returned {got} results for {expected} messages")]
    GatewayResultMismatch { expected: usize, got: usize },

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::RecipientNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::NoEndpoint(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InvalidEndpoint(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::NoValidRecipients => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::GatewayResultMismatch { .. } => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::Gateway(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
