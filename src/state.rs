//! Shared application state

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::blob::BlobStore;
use crate::cart::SessionCartStore;
use crate::config::Config;
use crate::db::DbService;
use crate::error::AppResult;
use crate::gateway::{PaymentGateway, StripeGateway};

/// State handed to every handler. Fields are public so tests can assemble
/// a state with an in-memory pool and a scripted gateway.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub blob: Arc<BlobStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub carts: Arc<SessionCartStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = DbService::new(&config.db_path).await?;
        let blob = BlobStore::new(&config.blob_root)?;
        let gateway = StripeGateway::new(config.gateway_secret_key.clone());

        Ok(Self {
            pool: db.pool,
            blob: Arc::new(blob),
            gateway: Arc::new(gateway),
            carts: Arc::new(SessionCartStore::new()),
            config: Arc::new(config),
        })
    }
}
