use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user who can receive push notifications.
///
/// Registration and login are handled elsewhere; this subsystem only reads
/// recipients and mutates their `push_token` on re-registration.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recipient {
    pub id: Uuid,
    pub email: String,
    pub push_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome status reported by the push gateway for one submitted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum TicketStatus {
    Ok,
    Error,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Ok => write!(f, "ok"),
            TicketStatus::Error => write!(f, "error"),
        }
    }
}

/// One message bound for the push gateway.
///
/// Built transiently per dispatch request; only its outcome is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    /// Delivery endpoint token of the target device
    pub to: String,
    pub title: String,
    pub body: String,
    pub sound: String,
    /// Arbitrary structured payload delivered alongside the notification
    pub data: serde_json::Value,
}

impl PushMessage {
    pub fn new(to: String, title: &str, body: &str, data: serde_json::Value) -> Self {
        Self {
            to,
            title: title.to_string(),
            body: body.to_string(),
            sound: "default".to_string(),
            data,
        }
    }
}

/// Per-message result returned by the push gateway, positionally aligned
/// with the message that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushReceipt {
    pub status: TicketStatus,
    /// Gateway ticket identifier, present on success
    #[serde(default)]
    pub id: Option<String>,
    /// Error detail from the gateway, present on failure
    #[serde(default)]
    pub message: Option<String>,
}

impl PushReceipt {
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            status: TicketStatus::Ok,
            id: Some(id.into()),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: TicketStatus::Error,
            id: None,
            message: Some(message.into()),
        }
    }
}

/// Persisted outcome of one message sent to one recipient.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeliveryRecord {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub status: TicketStatus,
    pub ticket_id: Option<String>,
    pub sent_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// One row-to-be of the delivery ledger, prior to insertion.
#[derive(Debug, Clone)]
pub struct DeliveryEntry {
    pub recipient_id: Uuid,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub status: TicketStatus,
    pub ticket_id: Option<String>,
    pub sent_at: DateTime<Utc>,
}
