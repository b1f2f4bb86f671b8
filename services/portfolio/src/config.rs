//! Service configuration loaded from the environment

use std::{env, path::PathBuf, str::FromStr};

use anyhow::{Result, anyhow};
use tower_sessions::cookie::Key;
use tracing::warn;

use crate::rate_limiter::RateLimiterConfig;

/// Largest accepted media file (50 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Portfolio service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP listener binds to
    pub bind_address: String,
    /// Directory holding uploaded media files
    pub upload_dir: PathBuf,
    /// Directory holding the built client bundle
    pub client_dir: PathBuf,
    /// Secret used to sign session cookies
    pub session_secret: Option<String>,
    /// Session lifetime in seconds of inactivity
    pub session_ttl_seconds: i64,
    /// Whether the session cookie carries the `Secure` attribute
    pub session_cookie_secure: bool,
    /// Admin username
    pub admin_user: Option<String>,
    /// Admin password
    pub admin_pass: Option<String>,
    /// Upload size cap in bytes
    pub max_upload_bytes: u64,
    /// Edge rate limiting
    pub rate_limit: RateLimiterConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            client_dir: PathBuf::from("frontend/dist"),
            session_secret: None,
            session_ttl_seconds: 3600,
            session_cookie_secure: false,
            admin_user: None,
            admin_pass: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            rate_limit: RateLimiterConfig::default(),
        }
    }
}

impl AppConfig {
    /// Create a new AppConfig from environment variables
    ///
    /// # Environment Variables
    /// - `BIND_ADDRESS`: listen address (default: "0.0.0.0:3000")
    /// - `UPLOAD_DIR`: media directory (default: "uploads")
    /// - `CLIENT_DIR`: client bundle directory (default: "frontend/dist")
    /// - `SESSION_SECRET`: cookie signing secret, at least 64 bytes (default: random)
    /// - `SESSION_TTL_SECONDS`: session expiry (default: 3600)
    /// - `SESSION_COOKIE_SECURE`: "true" to mark the cookie `Secure` (default: false)
    /// - `ADMIN_USER` / `ADMIN_PASS`: the admin credential pair (default: unset)
    /// - `MAX_UPLOAD_BYTES`: upload size cap (default: 52428800)
    /// - `RATE_LIMIT_MAX`: requests per window and client (default: 100)
    /// - `RATE_LIMIT_WINDOW_SECONDS`: rate limit window (default: 900)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            client_dir: env::var("CLIENT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.client_dir),
            session_secret: non_empty_var("SESSION_SECRET"),
            session_ttl_seconds: parse_var("SESSION_TTL_SECONDS", defaults.session_ttl_seconds),
            session_cookie_secure: parse_var(
                "SESSION_COOKIE_SECURE",
                defaults.session_cookie_secure,
            ),
            admin_user: non_empty_var("ADMIN_USER"),
            admin_pass: non_empty_var("ADMIN_PASS"),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            rate_limit: RateLimiterConfig {
                max_requests: parse_var("RATE_LIMIT_MAX", defaults.rate_limit.max_requests),
                window_seconds: parse_var(
                    "RATE_LIMIT_WINDOW_SECONDS",
                    defaults.rate_limit.window_seconds,
                ),
            },
        };

        // Fail at startup rather than on the first request
        config.session_key()?;

        Ok(config)
    }

    /// Key used to sign session cookies
    ///
    /// Without a configured secret a random key is generated, which is
    /// enough since sessions never outlive the process.
    pub fn session_key(&self) -> Result<Key> {
        match &self.session_secret {
            Some(secret) => Key::try_from(secret.as_bytes())
                .map_err(|_| anyhow!("SESSION_SECRET must be at least 64 bytes long")),
            None => {
                warn!("SESSION_SECRET not set, using a random signing key");
                Ok(Key::generate())
            }
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
