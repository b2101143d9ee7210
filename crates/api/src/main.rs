//! Courier API server binary entrypoint.

use std::net::SocketAddr;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use courier_common::config::AppConfig;
use courier_common::db::create_pool;

use courier_api::routes::create_router;
use courier_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("courier_api=debug,courier_dispatch=debug,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting Courier API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create database connection pool
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database pool created");

    // Build application state (wires the dispatch stack)
    let state = AppState::from_pool(pool, config);

    // Build router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
