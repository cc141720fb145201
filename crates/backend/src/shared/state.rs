use crate::shared::config::{AuthConfig, Config};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handler state: the database handle and accepted API tokens.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub auth: Arc<AuthConfig>,
    /// Held across a hierarchy check and the write it guards
    pub writes: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: &Config) -> Self {
        Self::with_auth(db, config.auth.clone())
    }

    pub fn with_auth(db: DatabaseConnection, auth: AuthConfig) -> Self {
        Self {
            db,
            auth: Arc::new(auth),
            writes: Arc::new(Mutex::new(())),
        }
    }
}
