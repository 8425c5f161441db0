use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use schedly_application::{AttemptInfo, RateLimitRepository};
use schedly_core::{AppError, AppResult};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    attempts: i32,
}

/// Process-local fixed-window rate limit counters.
///
/// Expired windows are replaced lazily on the next attempt and removed in
/// bulk by [`RateLimitRepository::cleanup_expired`].
#[derive(Debug, Default)]
pub struct InMemoryRateLimitRepository {
    windows: Mutex<HashMap<String, Window>>,
}

impl InMemoryRateLimitRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn record_at(
        &self,
        key: &str,
        window_duration_seconds: i64,
        now: DateTime<Utc>,
    ) -> AppResult<AttemptInfo> {
        if window_duration_seconds <= 0 {
            return Err(AppError::Validation(
                "window_duration_seconds must be greater than zero".to_owned(),
            ));
        }

        let mut windows = self.windows.lock().await;
        let window = windows
            .entry(key.to_owned())
            .and_modify(|window| {
                if window.ends_at <= now {
                    *window = Window::starting(now, window_duration_seconds);
                }
            })
            .or_insert_with(|| Window::starting(now, window_duration_seconds));
        window.attempts = window.attempts.saturating_add(1);

        Ok(AttemptInfo {
            attempt_count: window.attempts,
            window_started_at: window.started_at,
        })
    }
}

impl Window {
    fn starting(now: DateTime<Utc>, window_duration_seconds: i64) -> Self {
        Self {
            started_at: now,
            ends_at: now + Duration::seconds(window_duration_seconds),
            attempts: 0,
        }
    }
}

#[async_trait]
impl RateLimitRepository for InMemoryRateLimitRepository {
    async fn record_attempt(
        &self,
        key: &str,
        window_duration_seconds: i64,
    ) -> AppResult<AttemptInfo> {
        self.record_at(key, window_duration_seconds, Utc::now())
            .await
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, window| window.ends_at > now);
        Ok(u64::try_from(before - windows.len()).unwrap_or_default())
    }
}
