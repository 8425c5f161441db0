//! Redis-backed rate limit repository.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use schedly_application::{AttemptInfo, RateLimitRepository};
use schedly_core::{AppError, AppResult};

/// Fixed-window counters shared by every API instance.
///
/// Each key holds one counter that is created with the window as its TTL, so
/// the window ends when the key expires and
/// [`RateLimitRepository::cleanup_expired`] has nothing to remove.
#[derive(Clone)]
pub struct RedisRateLimitRepository {
    client: redis::Client,
    key_prefix: String,
}

impl RedisRateLimitRepository {
    /// Creates a repository with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn counter_key(&self, key: &str) -> String {
        format!("{}:{key}", self.key_prefix)
    }
}

#[async_trait]
impl RateLimitRepository for RedisRateLimitRepository {
    async fn record_attempt(
        &self,
        key: &str,
        window_duration_seconds: i64,
    ) -> AppResult<AttemptInfo> {
        if window_duration_seconds <= 0 {
            return Err(AppError::Validation(
                "window_duration_seconds must be greater than zero".to_owned(),
            ));
        }

        let mut connection = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| {
                AppError::StorageUnavailable(format!("failed to connect to redis: {error}"))
            })?;

        let counter_key = self.counter_key(key);
        // SET NX only opens a window when none is live; MULTI keeps the
        // three commands together so the TTL read matches the increment.
        let (attempt_count, remaining_seconds): (i64, i64) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&counter_key)
            .arg(0)
            .arg("EX")
            .arg(window_duration_seconds)
            .arg("NX")
            .ignore()
            .incr(&counter_key, 1)
            .ttl(&counter_key)
            .query_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::StorageUnavailable(format!(
                    "failed to record redis rate limit attempt: {error}"
                ))
            })?;

        let attempt_count = i32::try_from(attempt_count)
            .map_err(|error| AppError::Internal(format!("invalid redis attempt count: {error}")))?;
        let elapsed = window_duration_seconds - remaining_seconds.clamp(0, window_duration_seconds);
        let window_started_at = Utc::now() - Duration::seconds(elapsed);

        Ok(AttemptInfo {
            attempt_count,
            window_started_at,
        })
    }

    async fn cleanup_expired(&self, _now: DateTime<Utc>) -> AppResult<u64> {
        Ok(0)
    }
}
