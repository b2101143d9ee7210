use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Open the PostgreSQL pool shared by the API and dispatch layers.
///
/// `max_connections` comes from `AppConfig::db_max_connections` (default 20).
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    tracing::info!(max_connections, "Connected to PostgreSQL");
    Ok(pool)
}
