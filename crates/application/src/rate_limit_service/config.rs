/// Configuration for a rate limit rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRule {
    /// Category name used as the key prefix (e.g. "api", "session").
    pub category: String,
    /// Maximum number of attempts allowed in the window.
    pub max_attempts: i32,
    /// Window duration in seconds.
    pub window_seconds: i64,
}

impl RateLimitRule {
    /// Creates a new rate limit rule.
    #[must_use]
    pub fn new(category: impl Into<String>, max_attempts: i32, window_seconds: i64) -> Self {
        Self {
            category: category.into(),
            max_attempts,
            window_seconds,
        }
    }

    /// General API limit: 100 requests per minute per client address.
    #[must_use]
    pub fn api() -> Self {
        Self::new("api", 100, 60)
    }

    /// Session bootstrap limit: 10 attempts per 15 minutes per client address.
    #[must_use]
    pub fn session() -> Self {
        Self::new("session", 10, 15 * 60)
    }
}
