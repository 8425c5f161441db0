//! Event aggregate and its status-changing operations.
//!
//! Every mutation returns a fresh [`EventTransition`] that pairs the next
//! event state with its audit entry; stores persist both or neither.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schedly_core::{AppError, AppResult, NonEmptyString, UserId};
use serde::{Deserialize, Serialize};

use crate::lifecycle::{LifecycleAction, next_status};
use crate::{EventId, NewAuditEntry};

/// Maximum number of free-form tags kept on an event.
const MAX_TAGS: usize = 20;

/// Fixed category set for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Coding, engineering and science activities.
    Technical,
    /// Arts, music and festivals.
    Cultural,
    /// Sports fixtures and tournaments.
    Sports,
    /// Hands-on workshops.
    Workshop,
    /// Talks and seminars.
    Seminar,
    /// Contests and hackathons.
    Competition,
    /// Social gatherings.
    Social,
    /// Anything else.
    Other,
}

impl EventCategory {
    /// Returns the stable storage and transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technical => "Technical",
            Self::Cultural => "Cultural",
            Self::Sports => "Sports",
            Self::Workshop => "Workshop",
            Self::Seminar => "Seminar",
            Self::Competition => "Competition",
            Self::Social => "Social",
            Self::Other => "Other",
        }
    }

    /// Returns all known categories.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[EventCategory] = &[
            EventCategory::Technical,
            EventCategory::Cultural,
            EventCategory::Sports,
            EventCategory::Workshop,
            EventCategory::Seminar,
            EventCategory::Competition,
            EventCategory::Social,
            EventCategory::Other,
        ];

        ALL
    }
}

impl FromStr for EventCategory {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|category| category.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| AppError::Validation(format!("unknown event category '{value}'")))
    }
}

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Editable by its organizer.
    Draft,
    /// Waiting for faculty review.
    Submitted,
    /// Approved by faculty, waiting for an administrator.
    FacultyApproved,
    /// Rejected by faculty.
    FacultyRejected,
    /// Visible to students and open for registration.
    Published,
    /// Finished.
    Completed,
    /// Retired from every listing except Super Admin's.
    Archived,
}

impl EventStatus {
    /// Returns the stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::FacultyApproved => "faculty_approved",
            Self::FacultyRejected => "faculty_rejected",
            Self::Published => "published",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    /// Returns the human-readable label for this status.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Submitted => "Submitted",
            Self::FacultyApproved => "Faculty Approved",
            Self::FacultyRejected => "Faculty Rejected",
            Self::Published => "Published",
            Self::Completed => "Completed",
            Self::Archived => "Archived",
        }
    }

    /// Returns whether no lifecycle edge other than archival leaves this status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Archived | Self::FacultyRejected
        )
    }

    /// Returns all known statuses.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[EventStatus] = &[
            EventStatus::Draft,
            EventStatus::Submitted,
            EventStatus::FacultyApproved,
            EventStatus::FacultyRejected,
            EventStatus::Published,
            EventStatus::Completed,
            EventStatus::Archived,
        ];

        ALL
    }
}

impl Display for EventStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.label())
    }
}

impl FromStr for EventStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == value || status.label() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown event status '{value}'")))
    }
}

/// Unvalidated event details as received from a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetailsInput {
    /// Event title.
    pub title: String,
    /// Long-form description.
    pub description: String,
    /// Event category.
    pub category: EventCategory,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Start timestamp.
    pub starts_at: DateTime<Utc>,
    /// End timestamp.
    pub ends_at: DateTime<Utc>,
    /// Venue label.
    pub venue: String,
    /// Seat capacity.
    pub capacity: u32,
    /// Optional banner reference.
    pub banner_url: Option<String>,
}

/// Partial update for a draft event. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDetailsPatch {
    /// Replacement title.
    pub title: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement category.
    pub category: Option<EventCategory>,
    /// Replacement tag list.
    pub tags: Option<Vec<String>>,
    /// Replacement start timestamp.
    pub starts_at: Option<DateTime<Utc>>,
    /// Replacement end timestamp.
    pub ends_at: Option<DateTime<Utc>>,
    /// Replacement venue.
    pub venue: Option<String>,
    /// Replacement capacity.
    pub capacity: Option<u32>,
    /// Replacement banner reference. `Some(None)` clears it.
    pub banner_url: Option<Option<String>>,
}

impl EventDetailsPatch {
    /// Returns whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Validated descriptive attributes of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    title: NonEmptyString,
    description: NonEmptyString,
    category: EventCategory,
    tags: Vec<String>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    venue: NonEmptyString,
    capacity: u32,
    banner_url: Option<String>,
}

impl EventDetails {
    /// Validates caller input into event details.
    pub fn new(input: EventDetailsInput) -> AppResult<Self> {
        if input.ends_at < input.starts_at {
            return Err(AppError::Validation(
                "end date must not be before start date".to_owned(),
            ));
        }

        if input.capacity < 1 {
            return Err(AppError::Validation(
                "capacity must be at least 1".to_owned(),
            ));
        }

        Ok(Self {
            title: NonEmptyString::for_field("title", input.title)?,
            description: NonEmptyString::for_field("description", input.description)?,
            category: input.category,
            tags: normalize_tags(input.tags)?,
            starts_at: input.starts_at,
            ends_at: input.ends_at,
            venue: NonEmptyString::for_field("venue", input.venue)?,
            capacity: input.capacity,
            banner_url: input.banner_url.and_then(|value| {
                let trimmed = value.trim().to_owned();
                (!trimmed.is_empty()).then_some(trimmed)
            }),
        })
    }

    /// Applies a partial update and revalidates the result.
    pub fn patched(&self, patch: EventDetailsPatch) -> AppResult<Self> {
        Self::new(EventDetailsInput {
            title: patch
                .title
                .unwrap_or_else(|| self.title.as_str().to_owned()),
            description: patch
                .description
                .unwrap_or_else(|| self.description.as_str().to_owned()),
            category: patch.category.unwrap_or(self.category),
            tags: patch.tags.unwrap_or_else(|| self.tags.clone()),
            starts_at: patch.starts_at.unwrap_or(self.starts_at),
            ends_at: patch.ends_at.unwrap_or(self.ends_at),
            venue: patch
                .venue
                .unwrap_or_else(|| self.venue.as_str().to_owned()),
            capacity: patch.capacity.unwrap_or(self.capacity),
            banner_url: patch.banner_url.unwrap_or_else(|| self.banner_url.clone()),
        })
    }

    /// Returns the event title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Returns the event description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the event category.
    #[must_use]
    pub fn category(&self) -> EventCategory {
        self.category
    }

    /// Returns normalized tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the start timestamp.
    #[must_use]
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    /// Returns the end timestamp.
    #[must_use]
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    /// Returns the venue.
    #[must_use]
    pub fn venue(&self) -> &str {
        self.venue.as_str()
    }

    /// Returns the seat capacity.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Returns the banner reference.
    #[must_use]
    pub fn banner_url(&self) -> Option<&str> {
        self.banner_url.as_deref()
    }
}

fn normalize_tags(tags: Vec<String>) -> AppResult<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let trimmed = tag.trim();
        if trimmed.is_empty()
            || normalized
                .iter()
                .any(|existing| existing.eq_ignore_ascii_case(trimmed))
        {
            continue;
        }
        normalized.push(trimmed.to_owned());
    }

    if normalized.len() > MAX_TAGS {
        return Err(AppError::Validation(format!(
            "an event may carry at most {MAX_TAGS} tags"
        )));
    }

    Ok(normalized)
}

/// Faculty decision recorded on review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyReview {
    /// Reviewing faculty mentor.
    pub reviewer: UserId,
    /// Review timestamp.
    pub reviewed_at: DateTime<Utc>,
    /// Reviewer remarks.
    pub remarks: String,
}

/// Administrator approval recorded on publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminApproval {
    /// Approving administrator.
    pub approver: UserId,
    /// Approval timestamp.
    pub approved_at: DateTime<Utc>,
    /// Approver remarks.
    pub remarks: String,
}

/// Who performed a transition, when, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionStamp {
    /// Acting user.
    pub actor: UserId,
    /// Remarks captured with the transition; empty when none were given.
    pub remarks: String,
    /// Transition timestamp.
    pub at: DateTime<Utc>,
}

impl TransitionStamp {
    /// Creates a stamp, trimming optional remarks.
    #[must_use]
    pub fn new(actor: UserId, remarks: Option<String>, at: DateTime<Utc>) -> Self {
        Self {
            actor,
            remarks: remarks
                .map(|value| value.trim().to_owned())
                .unwrap_or_default(),
            at,
        }
    }
}

/// Next event state paired with the audit entry that records it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTransition {
    /// Status the stored event must still have for the write to apply.
    pub expected_status: EventStatus,
    /// Lifecycle version the stored event must still have for the write to apply.
    pub expected_version: i64,
    /// Event state after the transition.
    pub event: Event,
    /// Audit entry for the transition.
    pub audit: NewAuditEntry,
}

/// Full persisted event state, used by stores to rehydrate events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSnapshot {
    /// Event identifier.
    pub id: EventId,
    /// Owning organizer.
    pub organizer: UserId,
    /// Descriptive attributes.
    pub details: EventDetails,
    /// Current lifecycle status.
    pub status: EventStatus,
    /// Lifecycle version, bumped by every transition and revision.
    pub version: i64,
    /// Denormalized registration count.
    pub registration_count: u32,
    /// Faculty review sub-record.
    pub faculty_review: Option<FacultyReview>,
    /// Admin approval sub-record.
    pub admin_approval: Option<AdminApproval>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Archival timestamp.
    pub archived_at: Option<DateTime<Utc>>,
}

/// Campus event moving through the approval workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    id: EventId,
    organizer: UserId,
    details: EventDetails,
    status: EventStatus,
    version: i64,
    registration_count: u32,
    faculty_review: Option<FacultyReview>,
    admin_approval: Option<AdminApproval>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    archived_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Creates a new draft event owned by `organizer` with its creation audit entry.
    #[must_use]
    pub fn draft(
        organizer: UserId,
        details: EventDetails,
        at: DateTime<Utc>,
    ) -> (Self, NewAuditEntry) {
        let event = Self {
            id: EventId::new(),
            organizer,
            details,
            status: EventStatus::Draft,
            version: 1,
            registration_count: 0,
            faculty_review: None,
            admin_approval: None,
            created_at: at,
            updated_at: at,
            completed_at: None,
            archived_at: None,
        };
        let audit = NewAuditEntry {
            event_id: event.id,
            actor: organizer,
            action: crate::AuditAction::Create,
            from_status: None,
            to_status: EventStatus::Draft,
            remarks: String::new(),
            recorded_at: at,
        };

        (event, audit)
    }

    /// Rehydrates an event from persisted state.
    #[must_use]
    pub fn restore(snapshot: EventSnapshot) -> Self {
        Self {
            id: snapshot.id,
            organizer: snapshot.organizer,
            details: snapshot.details,
            status: snapshot.status,
            version: snapshot.version,
            registration_count: snapshot.registration_count,
            faculty_review: snapshot.faculty_review,
            admin_approval: snapshot.admin_approval,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            completed_at: snapshot.completed_at,
            archived_at: snapshot.archived_at,
        }
    }

    /// Returns the full persisted state of this event.
    #[must_use]
    pub fn snapshot(&self) -> EventSnapshot {
        EventSnapshot {
            id: self.id,
            organizer: self.organizer,
            details: self.details.clone(),
            status: self.status,
            version: self.version,
            registration_count: self.registration_count,
            faculty_review: self.faculty_review.clone(),
            admin_approval: self.admin_approval.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
            archived_at: self.archived_at,
        }
    }

    /// Returns a copy carrying `registration_count`.
    ///
    /// Stores use this to keep the count they own when applying a transition
    /// computed from an older read.
    #[must_use]
    pub fn with_registration_count(&self, registration_count: u32) -> Self {
        let mut next = self.clone();
        next.registration_count = registration_count;
        next
    }

    /// Computes the status transition for `action`.
    ///
    /// Fails with `InvalidTransition` when the current status has no edge
    /// for the action. `Create`, `Update` and `Delete` are not handled here.
    pub fn transition(
        &self,
        action: LifecycleAction,
        stamp: &TransitionStamp,
    ) -> AppResult<EventTransition> {
        let audit_action = match action {
            LifecycleAction::Create | LifecycleAction::Update | LifecycleAction::Delete => {
                return Err(AppError::Internal(format!(
                    "'{}' is not a status transition",
                    action.as_str()
                )));
            }
            other => other.audit_action().ok_or_else(|| {
                AppError::Internal(format!("'{}' has no audit action", other.as_str()))
            })?,
        };

        let to_status = next_status(Some(self.status), action)
            .ok_or_else(|| self.invalid_transition(action))?;

        let mut next = self.clone();
        next.status = to_status;
        next.version = self.version + 1;
        next.updated_at = stamp.at;
        match action {
            LifecycleAction::FacultyApprove | LifecycleAction::FacultyReject => {
                next.faculty_review = Some(FacultyReview {
                    reviewer: stamp.actor,
                    reviewed_at: stamp.at,
                    remarks: stamp.remarks.clone(),
                });
            }
            LifecycleAction::AdminApprove => {
                next.admin_approval = Some(AdminApproval {
                    approver: stamp.actor,
                    approved_at: stamp.at,
                    remarks: stamp.remarks.clone(),
                });
            }
            LifecycleAction::Complete => next.completed_at = Some(stamp.at),
            LifecycleAction::Archive => next.archived_at = Some(stamp.at),
            _ => {}
        }

        Ok(EventTransition {
            expected_status: self.status,
            expected_version: self.version,
            audit: NewAuditEntry {
                event_id: self.id,
                actor: stamp.actor,
                action: audit_action,
                from_status: Some(self.status),
                to_status,
                remarks: stamp.remarks.clone(),
                recorded_at: stamp.at,
            },
            event: next,
        })
    }

    /// Applies a details patch to a draft event.
    pub fn revise(
        &self,
        patch: EventDetailsPatch,
        stamp: &TransitionStamp,
    ) -> AppResult<EventTransition> {
        let to_status = next_status(Some(self.status), LifecycleAction::Update)
            .ok_or_else(|| self.invalid_transition(LifecycleAction::Update))?;

        let mut next = self.clone();
        next.details = self.details.patched(patch)?;
        next.version = self.version + 1;
        next.updated_at = stamp.at;

        Ok(EventTransition {
            expected_status: self.status,
            expected_version: self.version,
            audit: NewAuditEntry {
                event_id: self.id,
                actor: stamp.actor,
                action: crate::AuditAction::Update,
                from_status: Some(self.status),
                to_status,
                remarks: stamp.remarks.clone(),
                recorded_at: stamp.at,
            },
            event: next,
        })
    }

    /// Claims one seat for a new registration.
    ///
    /// Fails with `InvalidState` unless the event is published and with
    /// `Full` once every seat is taken.
    pub fn admit_registration(&self) -> AppResult<Self> {
        if self.status != EventStatus::Published {
            return Err(AppError::InvalidState(format!(
                "event '{}' is not open for registration (status '{}')",
                self.id, self.status
            )));
        }

        if self.is_full() {
            return Err(AppError::Full(format!(
                "event '{}' has no remaining seats",
                self.id
            )));
        }

        let mut next = self.clone();
        next.registration_count += 1;
        Ok(next)
    }

    /// Releases one seat. The count never drops below zero.
    #[must_use]
    pub fn release_registration(&self) -> Self {
        let mut next = self.clone();
        next.registration_count = self.registration_count.saturating_sub(1);
        next
    }

    fn invalid_transition(&self, action: LifecycleAction) -> AppError {
        AppError::InvalidTransition(format!(
            "cannot {} event '{}' while it is '{}'",
            action.verb(),
            self.id,
            self.status
        ))
    }

    /// Returns the event identifier.
    #[must_use]
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Returns the owning organizer.
    #[must_use]
    pub fn organizer(&self) -> UserId {
        self.organizer
    }

    /// Returns the descriptive attributes.
    #[must_use]
    pub fn details(&self) -> &EventDetails {
        &self.details
    }

    /// Returns the current lifecycle status.
    #[must_use]
    pub fn status(&self) -> EventStatus {
        self.status
    }

    /// Returns the lifecycle version.
    ///
    /// Registration count changes do not bump it; they are serialized
    /// separately by the registration write path.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Returns the number of active registrations.
    #[must_use]
    pub fn registration_count(&self) -> u32 {
        self.registration_count
    }

    /// Returns whether every seat is taken.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.registration_count >= self.details.capacity()
    }

    /// Returns the faculty review, if any.
    #[must_use]
    pub fn faculty_review(&self) -> Option<&FacultyReview> {
        self.faculty_review.as_ref()
    }

    /// Returns the admin approval, if any.
    #[must_use]
    pub fn admin_approval(&self) -> Option<&AdminApproval> {
        self.admin_approval.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last modification timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the completion timestamp.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the archival timestamp.
    #[must_use]
    pub fn archived_at(&self) -> Option<DateTime<Utc>> {
        self.archived_at
    }
}
