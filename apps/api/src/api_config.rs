use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use schedly_core::AppError;
use tracing_subscriber::EnvFilter;

const MIN_BOOTSTRAP_TOKEN_LEN: usize = 16;

/// Where events, registrations, audit entries and notifications live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres { database_url: String },
}

/// Where rate limit counters live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitBackend {
    Memory,
    Redis { redis_url: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub storage: StorageBackend,
    pub rate_limit: RateLimitBackend,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub rate_limit_sweep_interval: Duration,
    pub transition_max_retries: usize,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    pub fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let storage = match lookup("STORAGE_BACKEND")
            .unwrap_or_else(|| "memory".to_owned())
            .as_str()
        {
            "memory" => StorageBackend::Memory,
            "postgres" => StorageBackend::Postgres {
                database_url: required_non_empty(&lookup, "DATABASE_URL")?,
            },
            other => {
                return Err(AppError::Validation(format!(
                    "STORAGE_BACKEND must be either 'memory' or 'postgres', got '{other}'"
                )));
            }
        };

        if migrate_only && storage == StorageBackend::Memory {
            return Err(AppError::Validation(
                "migrate requires STORAGE_BACKEND=postgres".to_owned(),
            ));
        }

        let rate_limit = match lookup("RATE_LIMIT_BACKEND")
            .unwrap_or_else(|| "memory".to_owned())
            .as_str()
        {
            "memory" => RateLimitBackend::Memory,
            "redis" => RateLimitBackend::Redis {
                redis_url: required_non_empty(&lookup, "REDIS_URL")?,
            },
            other => {
                return Err(AppError::Validation(format!(
                    "RATE_LIMIT_BACKEND must be either 'memory' or 'redis', got '{other}'"
                )));
            }
        };

        let bootstrap_token = required_non_empty(&lookup, "AUTH_BOOTSTRAP_TOKEN")?;
        if bootstrap_token.len() < MIN_BOOTSTRAP_TOKEN_LEN {
            return Err(AppError::Validation(format!(
                "AUTH_BOOTSTRAP_TOKEN must be at least {MIN_BOOTSTRAP_TOKEN_LEN} characters"
            )));
        }

        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());
        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = parse_or(&lookup, "API_PORT", 3001_u16)?;
        let cookie_secure = lookup("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let sweep_seconds = parse_or(&lookup, "RATE_LIMIT_SWEEP_SECONDS", 900_u64)?;
        if sweep_seconds == 0 {
            return Err(AppError::Validation(
                "RATE_LIMIT_SWEEP_SECONDS must be greater than zero".to_owned(),
            ));
        }
        let transition_max_retries = parse_or(&lookup, "TRANSITION_MAX_RETRIES", 3_usize)?;

        Ok(Self {
            migrate_only,
            storage,
            rate_limit,
            frontend_url,
            bootstrap_token,
            api_host,
            api_port,
            cookie_secure,
            rate_limit_sweep_interval: Duration::from_secs(sweep_seconds),
            transition_max_retries,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Validation(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_non_empty(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<String, AppError> {
    let value = lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use schedly_core::AppError;

    use super::{ApiConfig, RateLimitBackend, StorageBackend};

    fn load(pairs: &[(&str, &str)]) -> Result<ApiConfig, AppError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        ApiConfig::from_lookup(false, |name| values.get(name).cloned())
    }

    #[test]
    fn defaults_to_in_memory_backends() {
        let config = load(&[("AUTH_BOOTSTRAP_TOKEN", "0123456789abcdef")])
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.rate_limit, RateLimitBackend::Memory);
        assert_eq!(config.api_port, 3001);
        assert_eq!(config.rate_limit_sweep_interval, Duration::from_secs(900));
        assert_eq!(config.transition_max_retries, 3);
        assert!(!config.cookie_secure);
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        let result = load(&[
            ("AUTH_BOOTSTRAP_TOKEN", "0123456789abcdef"),
            ("STORAGE_BACKEND", "postgres"),
        ]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn short_bootstrap_tokens_are_rejected() {
        let result = load(&[("AUTH_BOOTSTRAP_TOKEN", "short")]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn malformed_numbers_fail_start_up() {
        let result = load(&[
            ("AUTH_BOOTSTRAP_TOKEN", "0123456789abcdef"),
            ("API_PORT", "not-a-port"),
        ]);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn migrate_requires_postgres() {
        let result = ApiConfig::from_lookup(true, |name| {
            (name == "AUTH_BOOTSTRAP_TOKEN").then(|| "0123456789abcdef".to_owned())
        });
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
