use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use schedly_core::AppResult;

/// Repository port for rate limit counters.
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Records an attempt for the given key.
    ///
    /// Starts a fresh window when none is active for the key or the active
    /// one has ended. Returns the attempt count within the active window.
    async fn record_attempt(
        &self,
        key: &str,
        window_duration_seconds: i64,
    ) -> AppResult<AttemptInfo>;

    /// Removes counters whose window ended before `now`. Returns how many were removed.
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Information about the current rate limit window for a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptInfo {
    /// Number of attempts in the current window (including this one).
    pub attempt_count: i32,
    /// When the current window started.
    pub window_started_at: DateTime<Utc>,
}

impl AttemptInfo {
    /// Returns when the window holding this attempt closes.
    #[must_use]
    pub fn window_ends_at(&self, window_seconds: i64) -> DateTime<Utc> {
        self.window_started_at + Duration::seconds(window_seconds)
    }

    /// Whole seconds until the window closes, never less than one.
    #[must_use]
    pub fn retry_after_seconds(&self, window_seconds: i64, now: DateTime<Utc>) -> i64 {
        (self.window_ends_at(window_seconds) - now).num_seconds().max(1)
    }
}
