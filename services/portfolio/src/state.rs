//! Application state shared across handlers

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tower_sessions::cookie::Key;
use tracing::warn;

use crate::{
    auth::{CredentialVerifier, NoCredentials, StaticCredentials},
    config::AppConfig,
    rate_limiter::RateLimiter,
    repositories::WorkRepository,
    storage::MediaStorage,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Arc<AppConfig>,
    pub work_repository: WorkRepository,
    pub storage: MediaStorage,
    pub credentials: Arc<dyn CredentialVerifier>,
    pub rate_limiter: RateLimiter,
    pub session_key: Key,
}

impl AppState {
    /// Wire up state from configuration and an initialised pool
    ///
    /// Creates the media directory if it does not exist.
    pub async fn new(config: AppConfig, db_pool: SqlitePool) -> Result<Self> {
        let storage = MediaStorage::open(&config.upload_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create upload directory: {}",
                    config.upload_dir.display()
                )
            })?;

        let credentials: Arc<dyn CredentialVerifier> =
            match (&config.admin_user, &config.admin_pass) {
                (Some(user), Some(pass)) => Arc::new(StaticCredentials::new(user, pass)),
                _ => {
                    warn!("ADMIN_USER or ADMIN_PASS not set, admin login is disabled");
                    Arc::new(NoCredentials)
                }
            };

        let session_key = config.session_key()?;
        let rate_limiter = RateLimiter::new(config.rate_limit.clone());

        Ok(Self {
            work_repository: WorkRepository::new(db_pool.clone()),
            db_pool,
            config: Arc::new(config),
            storage,
            credentials,
            rate_limiter,
            session_key,
        })
    }
}
