//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization;
mod event_ports;
mod event_service;
mod notification_ports;
mod notification_service;
mod rate_limit_service;
mod registration_ports;
mod registration_service;
mod retry;

#[cfg(test)]
mod test_support;

pub use event_ports::{AuditLogRepository, ConditionalWrite, EventListQuery, EventRepository};
pub use event_service::{EventFilters, EventLifecycleService, EventWithAuditTrail};
pub use notification_ports::NotificationRepository;
pub use notification_service::{NOTIFICATION_PAGE_SIZE, NotificationFeed, NotificationService};
pub use rate_limit_service::{AttemptInfo, RateLimitRepository, RateLimitRule, RateLimitService};
pub use registration_ports::{
    CertificateWriteOutcome, Enrollment, RegistrationRepository, RegistrationWithEvent,
};
pub use registration_service::{CertificateView, RegistrationService};
pub use retry::{RetryPolicy, retry_transient};
