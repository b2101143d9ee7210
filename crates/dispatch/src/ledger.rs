//! Delivery ledger — the durable record of notification attempts.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use courier_common::error::AppError;
use courier_common::types::{DeliveryEntry, DeliveryRecord};

/// Records shown per recipient by the history query.
pub const HISTORY_PAGE_SIZE: i64 = 50;

/// Durable record of notification attempts.
///
/// `record_many` is atomic: either every entry becomes a persisted
/// `DeliveryRecord` or none does, and concurrent calls never interleave
/// partially from a reader's point of view.
#[async_trait]
pub trait DeliveryLedger: Send + Sync {
    /// Persist all entries in one transaction, returning the new record ids
    /// in entry order.
    async fn record_many(&self, entries: &[DeliveryEntry]) -> Result<Vec<Uuid>, AppError>;

    /// A recipient's delivery records, newest first, capped at
    /// [`HISTORY_PAGE_SIZE`].
    async fn history(&self, recipient_id: Uuid) -> Result<Vec<DeliveryRecord>, AppError>;
}

/// PostgreSQL-backed delivery ledger.
pub struct PgDeliveryLedger {
    pool: PgPool,
}

impl PgDeliveryLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryLedger for PgDeliveryLedger {
    async fn record_many(&self, entries: &[DeliveryEntry]) -> Result<Vec<Uuid>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(entries.len());

        for entry in entries {
            let id = Uuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO delivery_records
                    (id, recipient_id, title, body, data, status, ticket_id, sent_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(id)
            .bind(entry.recipient_id)
            .bind(&entry.title)
            .bind(&entry.body)
            .bind(&entry.data)
            .bind(entry.status)
            .bind(&entry.ticket_id)
            .bind(entry.sent_at)
            .execute(&mut *tx)
            .await?;

            ids.push(id);
        }

        tx.commit().await?;

        tracing::info!(records = ids.len(), "Delivery records committed");
        Ok(ids)
    }

    async fn history(&self, recipient_id: Uuid) -> Result<Vec<DeliveryRecord>, AppError> {
        let records: Vec<DeliveryRecord> = sqlx::query_as(
            r#"
            SELECT * FROM delivery_records
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(recipient_id)
        .bind(HISTORY_PAGE_SIZE)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
