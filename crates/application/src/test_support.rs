use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use schedly_core::{Actor, AppError, AppResult, Role, UserId};
use schedly_domain::{
    AuditLogEntry, Event, EventCategory, EventDetailsInput, EventDetailsPatch, EventId,
    EventStatus, EventTransition, NewAuditEntry, Notification, NotificationId, Registration,
    RegistrationId, ReviewDecision, TransitionStamp,
};
use tokio::sync::Mutex;

use crate::{
    AuditLogRepository, CertificateWriteOutcome, ConditionalWrite, Enrollment, EventListQuery,
    EventLifecycleService, EventRepository, NotificationRepository, NotificationService,
    RegistrationRepository, RegistrationService, RegistrationWithEvent, RetryPolicy,
};

pub(crate) fn actor(role: Role) -> Actor {
    Actor::new(UserId::new(), role.as_str(), role)
}

pub(crate) fn event_input(title: &str, category: EventCategory, capacity: u32) -> EventDetailsInput {
    let starts_at = Utc::now() + ChronoDuration::days(14);
    EventDetailsInput {
        title: title.to_owned(),
        description: "Campus event".to_owned(),
        category,
        tags: vec!["campus".to_owned()],
        starts_at,
        ends_at: starts_at + ChronoDuration::hours(2),
        venue: "Main Hall".to_owned(),
        capacity,
        banner_url: None,
    }
}

/// Services wired to shared fakes.
pub(crate) struct Harness {
    pub(crate) store: Arc<FakeEventStore>,
    pub(crate) notifications: Arc<FakeNotificationRepository>,
    pub(crate) lifecycle: EventLifecycleService,
    pub(crate) registrations: RegistrationService,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_notifications(FakeNotificationRepository::default())
    }

    pub(crate) fn with_notifications(notifications: FakeNotificationRepository) -> Self {
        let store = Arc::new(FakeEventStore::default());
        let notifications = Arc::new(notifications);
        let notification_service =
            NotificationService::new(notifications.clone(), Duration::from_secs(1));
        let policy = RetryPolicy::immediate(3);

        Self {
            lifecycle: EventLifecycleService::new(
                store.clone(),
                store.clone(),
                notification_service.clone(),
                policy,
            ),
            registrations: RegistrationService::new(
                store.clone(),
                store.clone(),
                notification_service,
                policy,
            ),
            store,
            notifications,
        }
    }

    /// Drives a new event through review to `Published`.
    pub(crate) async fn published_event(&self, organizer: &Actor, capacity: u32) -> Event {
        let event = self
            .lifecycle
            .create_event(
                organizer,
                event_input("Hack Night", EventCategory::Competition, capacity),
            )
            .await
            .unwrap_or_else(|_| unreachable!());
        self.lifecycle
            .submit_event(organizer, event.id(), None)
            .await
            .unwrap_or_else(|_| unreachable!());
        self.lifecycle
            .faculty_review(
                &actor(Role::FacultyMentor),
                event.id(),
                ReviewDecision::Approve,
                None,
            )
            .await
            .unwrap_or_else(|_| unreachable!());
        self.lifecycle
            .admin_approve(&actor(Role::CollegeAdmin), event.id(), None)
            .await
            .unwrap_or_else(|_| unreachable!())
    }
}

#[derive(Default)]
struct StoreState {
    events: HashMap<EventId, Event>,
    registrations: HashMap<RegistrationId, Registration>,
    audit: Vec<AuditLogEntry>,
}

impl StoreState {
    fn append_audit(&mut self, entry: NewAuditEntry) {
        let sequence = i64::try_from(self.audit.len()).unwrap_or(i64::MAX) + 1;
        self.audit.push(entry.into_entry(sequence));
    }
}

/// Event, registration and audit fake sharing one lock.
#[derive(Default)]
pub(crate) struct FakeEventStore {
    state: Mutex<StoreState>,
    pending_storage_failures: AtomicUsize,
    concurrent_status: Mutex<Option<EventStatus>>,
    concurrent_revision: Mutex<Option<EventDetailsPatch>>,
    always_stale: AtomicBool,
}

impl FakeEventStore {
    /// Makes the next `count` transition writes fail with `StorageUnavailable`.
    pub(crate) fn fail_next_writes(&self, count: usize) {
        self.pending_storage_failures.store(count, Ordering::SeqCst);
    }

    /// Moves the stored event to `status` right before the next transition
    /// write, as a competing request would.
    pub(crate) async fn race_next_transition_to(&self, status: EventStatus) {
        *self.concurrent_status.lock().await = Some(status);
    }

    /// Commits `patch` as an organizer edit right before the next
    /// transition write, after the caller has already read the event.
    pub(crate) async fn revise_before_next_transition(&self, patch: EventDetailsPatch) {
        *self.concurrent_revision.lock().await = Some(patch);
    }

    /// Makes every transition write observe a stale event.
    pub(crate) fn always_report_stale(&self) {
        self.always_stale.store(true, Ordering::SeqCst);
    }

    pub(crate) async fn audit_len(&self) -> usize {
        self.state.lock().await.audit.len()
    }

    pub(crate) async fn stored_event(&self, event_id: EventId) -> Option<Event> {
        self.state.lock().await.events.get(&event_id).cloned()
    }

    fn take_storage_failure(&self) -> bool {
        self.pending_storage_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |value| {
                value.checked_sub(1)
            })
            .is_ok()
    }
}

#[async_trait]
impl EventRepository for FakeEventStore {
    async fn insert_event(&self, event: Event, audit: NewAuditEntry) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.events.insert(event.id(), event);
        state.append_audit(audit);
        Ok(())
    }

    async fn find_event(&self, event_id: EventId) -> AppResult<Option<Event>> {
        Ok(self.state.lock().await.events.get(&event_id).cloned())
    }

    async fn list_events(&self, query: &EventListQuery) -> AppResult<Vec<Event>> {
        let state = self.state.lock().await;
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
        events.sort_by_key(|event| std::cmp::Reverse(event.created_at()));
        Ok(events)
    }

    async fn apply_transition(
        &self,
        transition: EventTransition,
    ) -> AppResult<ConditionalWrite<Event>> {
        if self.take_storage_failure() {
            return Err(AppError::StorageUnavailable(
                "simulated write failure".to_owned(),
            ));
        }

        let mut state = self.state.lock().await;
        let event_id = transition.event.id();
        if let Some(status) = self.concurrent_status.lock().await.take()
            && let Some(stored) = state.events.get(&event_id)
        {
            let mut snapshot = stored.snapshot();
            snapshot.status = status;
            snapshot.version += 1;
            state.events.insert(event_id, Event::restore(snapshot));
        }

        if let Some(patch) = self.concurrent_revision.lock().await.take()
            && let Some(stored) = state.events.get(&event_id)
        {
            let stamp = TransitionStamp::new(stored.organizer(), None, Utc::now());
            let revision = stored.revise(patch, &stamp)?;
            state.events.insert(event_id, revision.event);
            state.append_audit(revision.audit);
        }

        let Some(stored) = state.events.get(&event_id) else {
            return Ok(ConditionalWrite::Missing);
        };

        if self.always_stale.load(Ordering::SeqCst)
            || stored.status() != transition.expected_status
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
        let mut state = self.state.lock().await;
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
        Ok(ConditionalWrite::Applied(()))
    }
}

#[async_trait]
impl AuditLogRepository for FakeEventStore {
    async fn list_for_event(&self, event_id: EventId) -> AppResult<Vec<AuditLogEntry>> {
        let state = self.state.lock().await;
        Ok(state
            .audit
            .iter()
            .rev()
            .filter(|entry| entry.event_id == event_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RegistrationRepository for FakeEventStore {
    async fn enroll(&self, registration: Registration) -> AppResult<Enrollment> {
        let mut state = self.state.lock().await;
        let event = state
            .events
            .get(&registration.event_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("event '{}' does not exist", registration.event_id))
            })?
            .admit_registration()?;

        if state.registrations.values().any(|existing| {
            existing.event_id == registration.event_id && existing.student == registration.student
        }) {
            return Err(AppError::Conflict(
                "student is already registered for this event".to_owned(),
            ));
        }

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
            .lock()
            .await
            .registrations
            .get(&registration_id)
            .cloned())
    }

    async fn withdraw(&self, registration_id: RegistrationId) -> AppResult<Option<Registration>> {
        let mut state = self.state.lock().await;
        let Some(registration) = state.registrations.remove(&registration_id) else {
            return Ok(None);
        };

        if let Some(event) = state.events.get(&registration.event_id) {
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
        let mut state = self.state.lock().await;
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
        let mut state = self.state.lock().await;
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
            Err(_) => Ok(CertificateWriteOutcome::NotAttended),
        }
    }

    async fn list_for_student(&self, student: UserId) -> AppResult<Vec<RegistrationWithEvent>> {
        let state = self.state.lock().await;
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
        rows.sort_by_key(|row| std::cmp::Reverse(row.registration.registered_at));
        Ok(rows)
    }

    async fn list_for_event(&self, event_id: EventId) -> AppResult<Vec<Registration>> {
        let state = self.state.lock().await;
        let mut rows: Vec<Registration> = state
            .registrations
            .values()
            .filter(|registration| registration.event_id == event_id)
            .cloned()
            .collect();
        rows.sort_by_key(|registration| std::cmp::Reverse(registration.registered_at));
        Ok(rows)
    }
}

#[derive(Default)]
pub(crate) struct FakeNotificationRepository {
    notifications: Mutex<Vec<Notification>>,
    unavailable: AtomicBool,
}

impl FakeNotificationRepository {
    /// Returns a repository whose writes always fail.
    pub(crate) fn unavailable() -> Self {
        Self {
            unavailable: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub(crate) async fn sent_to(&self, recipient: UserId) -> Vec<Notification> {
        self.notifications
            .lock()
            .await
            .iter()
            .filter(|notification| notification.recipient == recipient)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NotificationRepository for FakeNotificationRepository {
    async fn create_notification(&self, notification: Notification) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::StorageUnavailable(
                "notification store offline".to_owned(),
            ));
        }
        self.notifications.lock().await.push(notification);
        Ok(())
    }

    async fn list_for_recipient(
        &self,
        recipient: UserId,
        unread_only: bool,
        limit: usize,
    ) -> AppResult<Vec<Notification>> {
        Ok(self
            .notifications
            .lock()
            .await
            .iter()
            .rev()
            .filter(|notification| notification.recipient == recipient)
            .filter(|notification| !unread_only || !notification.is_read)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_unread(&self, recipient: UserId) -> AppResult<u64> {
        let count = self
            .notifications
            .lock()
            .await
            .iter()
            .filter(|notification| notification.recipient == recipient && !notification.is_read)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn find_notification(
        &self,
        notification_id: NotificationId,
    ) -> AppResult<Option<Notification>> {
        Ok(self
            .notifications
            .lock()
            .await
            .iter()
            .find(|notification| notification.id == notification_id)
            .cloned())
    }

    async fn mark_read(
        &self,
        notification_id: NotificationId,
    ) -> AppResult<Option<Notification>> {
        let mut notifications = self.notifications.lock().await;
        Ok(notifications
            .iter_mut()
            .find(|notification| notification.id == notification_id)
            .map(|notification| {
                notification.is_read = true;
                notification.clone()
            }))
    }

    async fn mark_all_read(&self, recipient: UserId) -> AppResult<u64> {
        let mut changed = 0;
        for notification in self.notifications.lock().await.iter_mut() {
            if notification.recipient == recipient && !notification.is_read {
                notification.is_read = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn delete_notification(&self, notification_id: NotificationId) -> AppResult<bool> {
        let mut notifications = self.notifications.lock().await;
        let before = notifications.len();
        notifications.retain(|notification| notification.id != notification_id);
        Ok(notifications.len() != before)
    }
}
