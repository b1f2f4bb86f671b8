//! Fixed-window rate limiter keyed by client address

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Entries beyond this count trigger a sweep of expired windows
const PRUNE_THRESHOLD: usize = 10_000;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of requests allowed per window
    pub max_requests: u32,
    /// Time window in seconds
    pub window_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_seconds: 900, // 15 minutes
        }
    }
}

/// Rate limiter entry
#[derive(Debug)]
struct RateLimiterEntry {
    /// Requests counted in the current window
    requests: u32,
    /// Start of the current window
    window_start: Instant,
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the current window ends
    pub reset_after: Duration,
}

/// Rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Rate limiter configuration
    config: RateLimiterConfig,
    /// Rate limiter entries
    entries: Arc<Mutex<HashMap<String, RateLimiterEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count a request for `key` and decide whether it may proceed
    ///
    /// Rejected requests are not counted.
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(self.config.window_seconds);

        if entries.len() >= PRUNE_THRESHOLD {
            entries.retain(|_, entry| now.duration_since(entry.window_start) < window);
        }

        let entry = entries.entry(key.to_string()).or_insert(RateLimiterEntry {
            requests: 0,
            window_start: now,
        });

        // Check if window has expired
        if now.duration_since(entry.window_start) >= window {
            entry.requests = 0;
            entry.window_start = now;
        }

        let reset_after = window.saturating_sub(now.duration_since(entry.window_start));
        let limit = self.config.max_requests;

        if entry.requests >= limit {
            debug!("Rate limit exceeded for key {}", key);
            return RateLimitDecision {
                allowed: false,
                limit,
                remaining: 0,
                reset_after,
            };
        }

        entry.requests += 1;

        RateLimitDecision {
            allowed: true,
            limit,
            remaining: limit - entry.requests,
            reset_after,
        }
    }

    /// Get the rate limiter configuration
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}
