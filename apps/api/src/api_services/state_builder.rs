use std::sync::Arc;
use std::time::Duration;

use schedly_application::{
    AuditLogRepository, EventLifecycleService, EventRepository, NotificationRepository,
    NotificationService, RateLimitRepository, RateLimitService, RegistrationRepository,
    RegistrationService, RetryPolicy,
};
use schedly_core::AppError;
use schedly_infrastructure::{
    InMemoryEventStore, InMemoryNotificationRepository, InMemoryRateLimitRepository,
    PostgresAuditLogRepository, PostgresEventRepository, PostgresNotificationRepository,
    PostgresRegistrationRepository, RedisRateLimitRepository,
};
use sqlx::PgPool;

use crate::api_config::{ApiConfig, RateLimitBackend};
use crate::state::AppState;

const NOTIFICATION_DISPATCH_TIMEOUT: Duration = Duration::from_secs(2);

/// Repository set backing the application services.
#[derive(Clone)]
pub struct Stores {
    pub events: Arc<dyn EventRepository>,
    pub audit_log: Arc<dyn AuditLogRepository>,
    pub registrations: Arc<dyn RegistrationRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
}

impl Stores {
    /// One in-process store so event, registration and audit writes share a lock.
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryEventStore::new());
        Self {
            events: store.clone(),
            audit_log: store.clone(),
            registrations: store,
            notifications: Arc::new(InMemoryNotificationRepository::new()),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            events: Arc::new(PostgresEventRepository::new(pool.clone())),
            audit_log: Arc::new(PostgresAuditLogRepository::new(pool.clone())),
            registrations: Arc::new(PostgresRegistrationRepository::new(pool.clone())),
            notifications: Arc::new(PostgresNotificationRepository::new(pool)),
        }
    }
}

pub fn build_rate_limit_repository(
    backend: &RateLimitBackend,
) -> Result<Arc<dyn RateLimitRepository>, AppError> {
    match backend {
        RateLimitBackend::Memory => Ok(Arc::new(InMemoryRateLimitRepository::new())),
        RateLimitBackend::Redis { redis_url } => {
            let client = redis::Client::open(redis_url.as_str())
                .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))?;
            Ok(Arc::new(RedisRateLimitRepository::new(
                client,
                "schedly:rate-limit",
            )))
        }
    }
}

pub fn build_app_state(
    config: &ApiConfig,
    stores: Stores,
    rate_limits: Arc<dyn RateLimitRepository>,
) -> AppState {
    let retry_policy = RetryPolicy::with_max_retries(config.transition_max_retries);
    let notification_service =
        NotificationService::new(stores.notifications, NOTIFICATION_DISPATCH_TIMEOUT);

    AppState {
        event_service: EventLifecycleService::new(
            stores.events.clone(),
            stores.audit_log,
            notification_service.clone(),
            retry_policy,
        ),
        registration_service: RegistrationService::new(
            stores.registrations,
            stores.events,
            notification_service.clone(),
            retry_policy,
        ),
        notification_service,
        rate_limit_service: RateLimitService::new(rate_limits),
        frontend_url: config.frontend_url.clone(),
        bootstrap_token: config.bootstrap_token.clone(),
    }
}
