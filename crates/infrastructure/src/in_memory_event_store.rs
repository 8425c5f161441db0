use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use schedly_application::{
    AuditLogRepository, CertificateWriteOutcome, ConditionalWrite, Enrollment, EventListQuery,
    EventRepository, RegistrationRepository, RegistrationWithEvent,
};
use schedly_core::{AppError, AppResult, UserId};
use schedly_domain::{
    AuditLogEntry, Event, EventId, EventStatus, EventTransition, NewAuditEntry, Registration,
    RegistrationId,
};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct StoreState {
    events: HashMap<EventId, Event>,
    registrations: HashMap<RegistrationId, Registration>,
    enrolled: HashSet<(UserId, EventId)>,
    audit_log: Vec<AuditLogEntry>,
}

impl StoreState {
    fn append_audit(&mut self, entry: NewAuditEntry) {
        let sequence = self
            .audit_log
            .last()
            .map_or(1, |previous| previous.sequence + 1);
        self.audit_log.push(entry.into_entry(sequence));
    }
}

/// In-memory event, registration and audit store.
///
/// All three share one lock so every write that spans them (a transition
/// and its audit entry, a registration and its seat) is applied atomically.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    state: RwLock<StoreState>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventStore {
    async fn insert_event(&self, event: Event, audit: NewAuditEntry) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.events.contains_key(&event.id()) {
            return Err(AppError::Conflict(format!(
                "event '{}' already exists",
                event.id()
            )));
        }

        state.events.insert(event.id(), event);
        state.append_audit(audit);
        Ok(())
    }

    async fn find_event(&self, event_id: EventId) -> AppResult<Option<Event>> {
        Ok(self.state.read().await.events.get(&event_id).cloned())
    }

    async fn list_events(&self, query: &EventListQuery) -> AppResult<Vec<Event>> {
        let state = self.state.read().await;
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|event| query.visibility.permits(event))
            .filter(|event| {
                query
                    .category
                    .is_none_or(|category| event.details().category() == category)
            })
            .filter(|event| query.status.is_none_or(|status| event.status() == status))
            .cloned()
            .collect();

        events.sort_by_key(|event| Reverse(event.created_at()));
        Ok(events)
    }

    async fn apply_transition(
        &self,
        transition: EventTransition,
    ) -> AppResult<ConditionalWrite<Event>> {
        let mut state = self.state.write().await;
        let event_id = transition.event.id();
        let Some(stored) = state.events.get(&event_id) else {
            return Ok(ConditionalWrite::Missing);
        };

        if stored.status() != transition.expected_status
            || stored.version() != transition.expected_version
        {
            return Ok(ConditionalWrite::Stale {
                status: stored.status(),
                version: stored.version(),
            });
        }

        let next = transition
            .event
            .with_registration_count(stored.registration_count());
        state.events.insert(event_id, next.clone());
        state.append_audit(transition.audit);
        Ok(ConditionalWrite::Applied(next))
    }

    async fn delete_event(
        &self,
        event_id: EventId,
        expected_status: EventStatus,
    ) -> AppResult<ConditionalWrite<()>> {
        let mut state = self.state.write().await;
        let Some(stored) = state.events.get(&event_id) else {
            return Ok(ConditionalWrite::Missing);
        };

        if stored.status() != expected_status {
            return Ok(ConditionalWrite::Stale {
                status: stored.status(),
                version: stored.version(),
            });
        }

        state.events.remove(&event_id);
        state
            .registrations
            .retain(|_, registration| registration.event_id != event_id);
        state.enrolled.retain(|(_, enrolled_event)| *enrolled_event != event_id);
        Ok(ConditionalWrite::Applied(()))
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryEventStore {
    async fn list_for_event(&self, event_id: EventId) -> AppResult<Vec<AuditLogEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<AuditLogEntry> = state
            .audit_log
            .iter()
            .filter(|entry| entry.event_id == event_id)
            .cloned()
            .collect();

        entries.sort_by_key(|entry| Reverse(entry.sequence));
        Ok(entries)
    }
}

#[async_trait]
impl RegistrationRepository for InMemoryEventStore {
    async fn enroll(&self, registration: Registration) -> AppResult<Enrollment> {
        let mut state = self.state.write().await;
        let event = state
            .events
            .get(&registration.event_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("event '{}' does not exist", registration.event_id))
            })?
            .admit_registration()?;

        let key = (registration.student, registration.event_id);
        if state.enrolled.contains(&key) {
            return Err(AppError::Conflict(format!(
                "student '{}' is already registered for event '{}'",
                registration.student, registration.event_id
            )));
        }

        state.enrolled.insert(key);
        state.events.insert(event.id(), event.clone());
        state
            .registrations
            .insert(registration.id, registration.clone());

        Ok(Enrollment {
            registration,
            event,
        })
    }

    async fn find_registration(
        &self,
        registration_id: RegistrationId,
    ) -> AppResult<Option<Registration>> {
        Ok(self
            .state
            .read()
            .await
            .registrations
            .get(&registration_id)
            .cloned())
    }

    async fn withdraw(&self, registration_id: RegistrationId) -> AppResult<Option<Registration>> {
        let mut state = self.state.write().await;
        let Some(registration) = state.registrations.remove(&registration_id) else {
            return Ok(None);
        };

        state
            .enrolled
            .remove(&(registration.student, registration.event_id));
        if let Some(event) = state.events.get(&registration.event_id) {
            if event.registration_count() == 0 {
                tracing::warn!(
                    event_id = %event.id(),
                    registration_id = %registration_id,
                    "registration count already zero on withdrawal"
                );
            }
            let released = event.release_registration();
            state.events.insert(released.id(), released);
        }

        Ok(Some(registration))
    }

    async fn set_attendance(
        &self,
        registration_id: RegistrationId,
        attended: bool,
    ) -> AppResult<Option<Registration>> {
        let mut state = self.state.write().await;
        let Some(registration) = state.registrations.get_mut(&registration_id) else {
            return Ok(None);
        };

        *registration = registration.with_attendance(attended)?;
        Ok(Some(registration.clone()))
    }

    async fn record_certificate(
        &self,
        registration_id: RegistrationId,
        certificate_url: String,
    ) -> AppResult<CertificateWriteOutcome> {
        let mut state = self.state.write().await;
        let Some(registration) = state.registrations.get_mut(&registration_id) else {
            return Ok(CertificateWriteOutcome::Missing);
        };

        if registration.certificate_issued {
            return Ok(CertificateWriteOutcome::AlreadyIssued(registration.clone()));
        }

        match registration.with_certificate(certificate_url) {
            Ok(issued) => {
                *registration = issued.clone();
                Ok(CertificateWriteOutcome::Issued(issued))
            }
            Err(AppError::InvalidState(_)) => Ok(CertificateWriteOutcome::NotAttended),
            Err(error) => Err(error),
        }
    }

    async fn list_for_student(&self, student: UserId) -> AppResult<Vec<RegistrationWithEvent>> {
        let state = self.state.read().await;
        let mut rows: Vec<RegistrationWithEvent> = state
            .registrations
            .values()
            .filter(|registration| registration.student == student)
            .filter_map(|registration| {
                state
                    .events
                    .get(&registration.event_id)
                    .map(|event| RegistrationWithEvent {
                        registration: registration.clone(),
                        event: event.clone(),
                    })
            })
            .collect();

        rows.sort_by_key(|row| Reverse(row.registration.registered_at));
        Ok(rows)
    }

    async fn list_for_event(&self, event_id: EventId) -> AppResult<Vec<Registration>> {
        let state = self.state.read().await;
        let mut rows: Vec<Registration> = state
            .registrations
            .values()
            .filter(|registration| registration.event_id == event_id)
            .cloned()
            .collect();

        rows.sort_by_key(|registration| Reverse(registration.registered_at));
        Ok(rows)
    }
}
