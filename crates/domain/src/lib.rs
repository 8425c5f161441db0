//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod capability;
mod event;
mod ids;
mod lifecycle;
mod notification;
mod registration;

pub use audit::{AuditAction, AuditLogEntry, NewAuditEntry};
pub use capability::{Capability, EventVisibility, Scope, grant_for};
pub use event::{
    AdminApproval, Event, EventCategory, EventDetails, EventDetailsInput, EventDetailsPatch,
    EventSnapshot, EventStatus, EventTransition, FacultyReview, TransitionStamp,
};
pub use ids::{EventId, NotificationId, RegistrationId};
pub use lifecycle::{LifecycleAction, ReviewDecision, deletion_allowed, next_status};
pub use notification::{NewNotification, Notification, NotificationType};
pub use registration::{CERTIFICATE_BASE_URL, Registration};
