use std::sync::Arc;

use chrono::Utc;
use schedly_core::{Actor, AppError, AppResult};
use schedly_domain::{
    AuditLogEntry, Capability, Event, EventCategory, EventDetails, EventDetailsInput,
    EventDetailsPatch, EventId, EventStatus, EventTransition, EventVisibility, TransitionStamp,
};

use crate::authorization::{require_capability, require_scope};
use crate::retry::{RetryPolicy, retry_transient};
use crate::{
    AuditLogRepository, ConditionalWrite, EventListQuery, EventRepository, NotificationService,
};

mod transitions;

/// Event returned together with its audit trail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventWithAuditTrail {
    /// Event state.
    pub event: Event,
    /// Audit entries, newest first.
    pub audit_trail: Vec<AuditLogEntry>,
}

/// Optional filters accepted by event listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFilters {
    /// Only events in this category.
    pub category: Option<EventCategory>,
    /// Only events in this status.
    pub status: Option<EventStatus>,
}

/// Application service driving the event approval workflow.
#[derive(Clone)]
pub struct EventLifecycleService {
    events: Arc<dyn EventRepository>,
    audit_log: Arc<dyn AuditLogRepository>,
    notifications: NotificationService,
    retry_policy: RetryPolicy,
}

impl EventLifecycleService {
    /// Creates a lifecycle service.
    #[must_use]
    pub fn new(
        events: Arc<dyn EventRepository>,
        audit_log: Arc<dyn AuditLogRepository>,
        notifications: NotificationService,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            events,
            audit_log,
            notifications,
            retry_policy,
        }
    }

    /// Creates a draft event owned by the acting organizer.
    pub async fn create_event(&self, actor: &Actor, input: EventDetailsInput) -> AppResult<Event> {
        require_capability(actor, Capability::CreateEvent)?;
        let details = EventDetails::new(input)?;
        let (event, audit) = Event::draft(actor.user_id(), details, Utc::now());

        let events = self.events.clone();
        let (stored, stored_audit) = (event.clone(), audit);
        retry_transient(self.retry_policy, move || {
            let events = events.clone();
            let event = stored.clone();
            let audit = stored_audit.clone();
            async move { events.insert_event(event, audit).await }
        })
        .await?;

        tracing::info!(
            event_id = %event.id(),
            organizer = %actor.user_id(),
            "event created"
        );
        Ok(event)
    }

    /// Applies a partial edit to a draft event.
    pub async fn update_event(
        &self,
        actor: &Actor,
        event_id: EventId,
        patch: EventDetailsPatch,
        remarks: Option<String>,
    ) -> AppResult<Event> {
        if patch.is_empty() {
            return Err(AppError::Validation(
                "update must change at least one field".to_owned(),
            ));
        }

        self.run_transition(
            actor,
            event_id,
            Capability::UpdateEvent,
            remarks,
            |event, stamp| event.revise(patch.clone(), stamp),
        )
        .await
    }

    /// Loads one event visible to the actor with its audit trail.
    ///
    /// Events outside the actor's visibility report `NotFound`.
    pub async fn get_event(
        &self,
        actor: &Actor,
        event_id: EventId,
    ) -> AppResult<EventWithAuditTrail> {
        let event = self.load_event(event_id).await?;
        if !EventVisibility::for_actor(actor).permits(&event) {
            return Err(event_not_found(event_id));
        }

        let audit_trail = self.audit_log.list_for_event(event_id).await?;
        Ok(EventWithAuditTrail { event, audit_trail })
    }

    /// Lists events visible to the actor, newest created first.
    pub async fn list_events(&self, actor: &Actor, filters: EventFilters) -> AppResult<Vec<Event>> {
        self.events
            .list_events(&EventListQuery {
                visibility: EventVisibility::for_actor(actor),
                category: filters.category,
                status: filters.status,
            })
            .await
    }

    async fn load_event(&self, event_id: EventId) -> AppResult<Event> {
        self.events
            .find_event(event_id)
            .await?
            .ok_or_else(|| event_not_found(event_id))
    }

    /// Runs the authorize, load, compute, compare-and-set loop for one edge.
    ///
    /// The write applies only while the stored status and version match the
    /// read it was computed from. A lost race reloads the event and
    /// recomputes, so a competing transition surfaces as `InvalidTransition`
    /// and a competing edit is built upon rather than overwritten.
    /// Contention that outlasts the retry bound surfaces as
    /// `StorageUnavailable`.
    async fn run_transition<F>(
        &self,
        actor: &Actor,
        event_id: EventId,
        capability: Capability,
        remarks: Option<String>,
        compute: F,
    ) -> AppResult<Event>
    where
        F: Fn(&Event, &TransitionStamp) -> AppResult<EventTransition>,
    {
        let scope = require_capability(actor, capability)?;
        let mut attempt = 0;

        loop {
            let event = self.load_event(event_id).await?;
            require_scope(actor, scope, event.organizer(), capability)?;
            // never stamp earlier than the state being replaced
            let stamp = TransitionStamp::new(
                actor.user_id(),
                remarks.clone(),
                Utc::now().max(event.updated_at()),
            );
            let transition = compute(&event, &stamp)?;
            let action = transition.audit.action;
            let from_status = transition.expected_status;
            let expected_version = transition.expected_version;

            let events = self.events.clone();
            let write = retry_transient(self.retry_policy, move || {
                let events = events.clone();
                let transition = transition.clone();
                async move { events.apply_transition(transition).await }
            })
            .await?;

            match write {
                ConditionalWrite::Applied(stored) => {
                    tracing::info!(
                        event_id = %event_id,
                        actor = %actor.user_id(),
                        action = action.as_str(),
                        from_status = from_status.as_str(),
                        to_status = stored.status().as_str(),
                        "event transition applied"
                    );
                    return Ok(stored);
                }
                ConditionalWrite::Missing => return Err(event_not_found(event_id)),
                ConditionalWrite::Stale { status, version } => {
                    if attempt >= self.retry_policy.max_retries {
                        return Err(AppError::StorageUnavailable(format!(
                            "event '{event_id}' kept changing while applying '{}'",
                            action.as_str()
                        )));
                    }

                    tracing::debug!(
                        event_id = %event_id,
                        expected_status = from_status.as_str(),
                        expected_version,
                        current_status = status.as_str(),
                        current_version = version,
                        attempt,
                        "event changed concurrently, recomputing transition"
                    );
                    attempt += 1;
                }
            }
        }
    }
}

fn event_not_found(event_id: EventId) -> AppError {
    AppError::NotFound(format!("event '{event_id}' does not exist"))
}
