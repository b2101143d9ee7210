//! Shared application state for the Axum API server.

use std::sync::Arc;

use sqlx::PgPool;

use courier_common::config::AppConfig;
use courier_dispatch::{Dispatcher, PgDeliveryLedger, PgRecipientStore, RecipientStore};
use courier_gateway::{ExpoPushGateway, PushGateway};

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: AppConfig,
    pub dispatcher: Arc<Dispatcher>,
    pub recipients: Arc<dyn RecipientStore>,
    pub gateway: Arc<dyn PushGateway>,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: AppConfig,
        dispatcher: Arc<Dispatcher>,
        recipients: Arc<dyn RecipientStore>,
        gateway: Arc<dyn PushGateway>,
    ) -> Self {
        Self {
            pool,
            config,
            dispatcher,
            recipients,
            gateway,
        }
    }

    /// Wire the production dispatch stack over one connection pool.
    pub fn from_pool(pool: PgPool, config: AppConfig) -> Self {
        let recipients: Arc<dyn RecipientStore> = Arc::new(PgRecipientStore::new(pool.clone()));
        let gateway: Arc<dyn PushGateway> = Arc::new(ExpoPushGateway::new(
            config.gateway_url.clone(),
            config.gateway_access_token.clone(),
        ));
        let ledger = Arc::new(PgDeliveryLedger::new(pool.clone()));
        let dispatcher = Arc::new(Dispatcher::new(
            recipients.clone(),
            gateway.clone(),
            ledger,
        ));

        Self::new(pool, config, dispatcher, recipients, gateway)
    }
}
