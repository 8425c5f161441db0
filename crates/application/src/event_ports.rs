use async_trait::async_trait;
use schedly_core::AppResult;
use schedly_domain::{
    AuditLogEntry, Event, EventCategory, EventId, EventStatus, EventTransition, EventVisibility,
    NewAuditEntry,
};

/// Outcome of a write that is conditional on the stored event state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionalWrite<T> {
    /// The stored event matched and the write was applied.
    Applied(T),
    /// The event does not exist.
    Missing,
    /// The stored event moved on since it was read.
    Stale {
        /// Current stored status.
        status: EventStatus,
        /// Current stored lifecycle version.
        version: i64,
    },
}

/// Filters for event listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventListQuery {
    /// Role-derived visibility predicate, applied first.
    pub visibility: EventVisibility,
    /// Optional category filter.
    pub category: Option<EventCategory>,
    /// Optional status filter.
    pub status: Option<EventStatus>,
}

/// Repository port for event persistence.
///
/// Every status-changing write stores the event and its audit entry as one
/// unit: either both are visible afterwards or neither is.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Stores a new event together with its creation audit entry.
    async fn insert_event(&self, event: Event, audit: NewAuditEntry) -> AppResult<()>;

    /// Loads an event by id.
    async fn find_event(&self, event_id: EventId) -> AppResult<Option<Event>>;

    /// Lists events matching the query, newest created first.
    async fn list_events(&self, query: &EventListQuery) -> AppResult<Vec<Event>>;

    /// Applies a transition if the stored status and version still equal
    /// `transition.expected_status` and `transition.expected_version`.
    ///
    /// The registration count is owned by the registration write path and
    /// is never overwritten here; the applied variant carries the event as
    /// stored after the write.
    async fn apply_transition(
        &self,
        transition: EventTransition,
    ) -> AppResult<ConditionalWrite<Event>>;

    /// Deletes an event and its registrations if the stored status still
    /// equals `expected_status`. Audit entries are retained.
    async fn delete_event(
        &self,
        event_id: EventId,
        expected_status: EventStatus,
    ) -> AppResult<ConditionalWrite<()>>;
}

/// Read port for the append-only audit trail.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Lists audit entries for an event, newest first.
    async fn list_for_event(&self, event_id: EventId) -> AppResult<Vec<AuditLogEntry>>;
}
