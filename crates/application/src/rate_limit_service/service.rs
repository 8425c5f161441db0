use std::sync::Arc;

use chrono::Utc;

use schedly_core::{AppError, AppResult};

use super::config::RateLimitRule;
use super::ports::RateLimitRepository;

/// Application service for rate limiting.
#[derive(Clone)]
pub struct RateLimitService {
    repository: Arc<dyn RateLimitRepository>,
}

impl RateLimitService {
    /// Creates a new rate limit service.
    #[must_use]
    pub fn new(repository: Arc<dyn RateLimitRepository>) -> Self {
        Self { repository }
    }

    /// Records an attempt for `key` under `rule`.
    ///
    /// Returns `Err(AppError::RateLimited)` once the window's allowance is spent.
    /// `key` is usually the client address.
    pub async fn check_rate_limit(&self, rule: &RateLimitRule, key: &str) -> AppResult<()> {
        let composite_key = format!("{}:{key}", rule.category);
        let info = self
            .repository
            .record_attempt(&composite_key, rule.window_seconds)
            .await?;

        if info.attempt_count > rule.max_attempts {
            let retry_after = info.retry_after_seconds(rule.window_seconds, Utc::now());
            tracing::debug!(
                category = %rule.category,
                attempts = info.attempt_count,
                retry_after,
                "rate limit exceeded"
            );
            return Err(AppError::RateLimited(format!(
                "too many requests, please try again in {retry_after} seconds"
            )));
        }

        Ok(())
    }

    /// Removes expired counters. Run periodically by the sweep task.
    pub async fn cleanup(&self) -> AppResult<u64> {
        let removed = self.repository.cleanup_expired(Utc::now()).await?;
        tracing::debug!(removed, "rate limit sweep finished");
        Ok(removed)
    }
}
