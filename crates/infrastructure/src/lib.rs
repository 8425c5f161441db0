//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_event_store;
mod in_memory_notification_repository;
mod in_memory_rate_limit_repository;
mod postgres_audit_log_repository;
mod postgres_errors;
mod postgres_event_repository;
mod postgres_notification_repository;
mod postgres_registration_repository;
mod postgres_rows;
mod redis_rate_limit_repository;

pub use in_memory_event_store::InMemoryEventStore;
pub use in_memory_notification_repository::InMemoryNotificationRepository;
pub use in_memory_rate_limit_repository::InMemoryRateLimitRepository;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_event_repository::PostgresEventRepository;
pub use postgres_notification_repository::PostgresNotificationRepository;
pub use postgres_registration_repository::PostgresRegistrationRepository;
pub use redis_rate_limit_repository::RedisRateLimitRepository;
