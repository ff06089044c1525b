//! Shamba Database Layer
//!
//! Persistence for users, listings, messages and discussion posts.
//!
//! # Architecture
//!
//! - **Store traits**: `UserStore`, `ListingStore`, `MessageStore`,
//!   `DiscussionStore`; the rest of the system depends only on these
//! - **PostgreSQL**: production repositories built on SQLx
//! - **In-memory** (`mock` feature): test and local-development stores
//!
//! A [`Database`] is constructed explicitly and handed to the application
//! state; nothing here is global.

pub mod config;
pub mod error;
pub mod models;
pub mod repos;
pub mod store;

#[cfg(feature = "mock")]
pub mod memory;

use std::sync::Arc;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

pub use config::DatabaseConfig;
pub use error::{DbError, DbResult};
pub use models::*;
pub use repos::*;
pub use store::{DiscussionStore, ListingStore, MessageStore, UserStore};

/// Store handles plus the pool they share
pub struct Database {
    pg: Option<PgPool>,
    users: Arc<dyn UserStore>,
    listings: Arc<dyn ListingStore>,
    messages: Arc<dyn MessageStore>,
    discussions: Arc<dyn DiscussionStore>,
}

impl Database {
    /// Connect to PostgreSQL
    pub async fn connect(config: &DatabaseConfig) -> DbResult<Self> {
        info!("Connecting to PostgreSQL: {}", config.url_masked());

        let pg = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DbError::Connection(format!("PostgreSQL: {}", e)))?;

        info!("Connected to PostgreSQL");

        Ok(Self::from_pool(pg))
    }

    /// Wrap an existing pool
    pub fn from_pool(pg: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepo::new(pg.clone())),
            listings: Arc::new(PgListingRepo::new(pg.clone())),
            messages: Arc::new(PgMessageRepo::new(pg.clone())),
            discussions: Arc::new(PgDiscussionRepo::new(pg.clone())),
            pg: Some(pg),
        }
    }

    /// In-memory database for tests and local development
    #[cfg(feature = "mock")]
    pub fn new_mock() -> Self {
        let store = memory::MemoryStore::new();
        Self {
            pg: None,
            users: Arc::new(store.clone()),
            listings: Arc::new(store.clone()),
            messages: Arc::new(store.clone()),
            discussions: Arc::new(store),
        }
    }

    /// Run database migrations. A no-op without PostgreSQL.
    pub async fn migrate(&self) -> DbResult<()> {
        let Some(pg) = &self.pg else {
            return Ok(());
        };
        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(pg)
            .await
            .map_err(|e| DbError::Migration(e.to_string()))?;
        info!("Migrations complete");
        Ok(())
    }

    /// Health check
    pub async fn health_check(&self) -> DbResult<HealthStatus> {
        let postgres = match &self.pg {
            Some(pg) => Some(sqlx::query("SELECT 1").fetch_one(pg).await.is_ok()),
            None => None,
        };

        Ok(HealthStatus {
            postgres,
            healthy: postgres.unwrap_or(true),
        })
    }

    pub fn user_repo(&self) -> &dyn UserStore {
        self.users.as_ref()
    }

    pub fn listing_repo(&self) -> &dyn ListingStore {
        self.listings.as_ref()
    }

    pub fn message_repo(&self) -> &dyn MessageStore {
        self.messages.as_ref()
    }

    pub fn discussion_repo(&self) -> &dyn DiscussionStore {
        self.discussions.as_ref()
    }
}

/// Health status of the store
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// `None` when running on in-memory stores
    pub postgres: Option<bool>,
    pub healthy: bool,
}
