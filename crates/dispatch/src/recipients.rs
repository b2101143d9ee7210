//! Recipient resolution and push-token registration.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use courier_common::error::AppError;
use courier_common::types::Recipient;

/// Read access to registered recipients, plus the one mutation this
/// subsystem owns: re-registering a recipient's push token.
#[async_trait]
pub trait RecipientStore: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Recipient>, AppError>;

    /// Resolve the given ids, keeping only recipients with a registered
    /// push token. Order follows the store, not the input id list.
    async fn get_many_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Recipient>, AppError>;

    /// All recipients with a registered push token.
    async fn get_all_with_endpoint(&self) -> Result<Vec<Recipient>, AppError>;

    /// Overwrite the recipient's push token.
    async fn set_push_token(&self, id: Uuid, token: &str) -> Result<(), AppError>;
}

/// PostgreSQL-backed recipient store.
pub struct PgRecipientStore {
    pool: PgPool,
}

impl PgRecipientStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipientStore for PgRecipientStore {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Recipient>, AppError> {
        let recipient: Option<Recipient> =
            sqlx::query_as("SELECT * FROM recipients WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(recipient)
    }

    async fn get_many_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Recipient>, AppError> {
        let recipients: Vec<Recipient> = sqlx::query_as(
            r#"
            SELECT * FROM recipients
            WHERE id = ANY($1) AND push_token IS NOT NULL
            ORDER BY created_at
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(recipients)
    }

    async fn get_all_with_endpoint(&self) -> Result<Vec<Recipient>, AppError> {
        let recipients: Vec<Recipient> = sqlx::query_as(
            "SELECT * FROM recipients WHERE push_token IS NOT NULL ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(recipients)
    }

    async fn set_push_token(&self, id: Uuid, token: &str) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE recipients SET push_token = $1, updated_at = NOW() WHERE id = $2")
                .bind(token)
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::RecipientNotFound(id));
        }

        tracing::info!(recipient_id = %id, "Push token registered");
        Ok(())
    }
}
