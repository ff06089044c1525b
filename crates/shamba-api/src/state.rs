//! Application state shared across handlers
//!
//! Holds the store handles, the authentication service, the upload
//! directory and the per-listing locks.

use std::sync::Arc;

use shamba_auth::AuthService;
use shamba_db::Database;

use crate::assets::ImageStore;
use crate::locks::ListingLocks;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Database connections
    pub db: Arc<Database>,
    /// Authentication service
    pub auth: Arc<AuthService>,
    /// Uploaded image files
    pub images: ImageStore,
    /// Serializes update/delete per listing
    pub listing_locks: ListingLocks,
}

impl AppState {
    /// Create a new application state
    pub fn new(db: Arc<Database>, auth: Arc<AuthService>, images: ImageStore) -> Self {
        Self {
            db,
            auth,
            images,
            listing_locks: ListingLocks::new(),
        }
    }

    /// State on in-memory stores with cheap password hashing
    #[cfg(test)]
    pub fn test(upload_dir: &std::path::Path) -> Self {
        use shamba_auth::{AuthConfig, JwtConfig, PasswordConfig};

        let db = Arc::new(Database::new_mock());
        let auth_config = AuthConfig {
            jwt: JwtConfig {
                secret: "test-secret-key-at-least-32-bytes-long!!".to_string(),
                ..Default::default()
            },
            password: PasswordConfig {
                memory_cost: 1024,
                time_cost: 1,
                ..Default::default()
            },
        };
        let auth = Arc::new(AuthService::new(db.clone(), auth_config));

        Self::new(db, auth, ImageStore::new(upload_dir))
    }
}
