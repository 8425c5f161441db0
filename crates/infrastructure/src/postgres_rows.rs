//! Row types shared by the PostgreSQL adapters.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use schedly_core::{AppError, AppResult, UserId};
use schedly_domain::{
    AdminApproval, Event, EventCategory, EventDetails, EventDetailsInput, EventId, EventSnapshot,
    EventStatus, FacultyReview, Registration, RegistrationId,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::postgres_errors::non_negative;

pub(crate) const EVENT_COLUMNS: &str = r#"
    id, organizer_id, title, description, category, tags, starts_at, ends_at, venue,
    capacity, registration_count, banner_url, status, version,
    faculty_reviewer_id, faculty_reviewed_at, faculty_remarks,
    admin_approver_id, admin_approved_at, admin_remarks,
    created_at, updated_at, completed_at, archived_at
"#;

pub(crate) const REGISTRATION_COLUMNS: &str = r#"
    id, student_id, event_id, registered_at, attended, certificate_issued, certificate_url
"#;

#[derive(Debug, FromRow)]
pub(crate) struct EventRow {
    id: Uuid,
    organizer_id: Uuid,
    title: String,
    description: String,
    category: String,
    tags: Vec<String>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    venue: String,
    capacity: i32,
    registration_count: i32,
    banner_url: Option<String>,
    status: String,
    version: i64,
    faculty_reviewer_id: Option<Uuid>,
    faculty_reviewed_at: Option<DateTime<Utc>>,
    faculty_remarks: Option<String>,
    admin_approver_id: Option<Uuid>,
    admin_approved_at: Option<DateTime<Utc>>,
    admin_remarks: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    archived_at: Option<DateTime<Utc>>,
}

impl EventRow {
    pub(crate) fn into_event(self) -> AppResult<Event> {
        let details = EventDetails::new(EventDetailsInput {
            title: self.title,
            description: self.description,
            category: EventCategory::from_str(self.category.as_str())?,
            tags: self.tags,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            venue: self.venue,
            capacity: non_negative("capacity", self.capacity)?,
            banner_url: self.banner_url,
        })
        .map_err(|error| {
            AppError::Internal(format!("stored event '{}' is invalid: {error}", self.id))
        })?;

        let faculty_review = match (self.faculty_reviewer_id, self.faculty_reviewed_at) {
            (Some(reviewer), Some(reviewed_at)) => Some(FacultyReview {
                reviewer: UserId::from_uuid(reviewer),
                reviewed_at,
                remarks: self.faculty_remarks.unwrap_or_default(),
            }),
            _ => None,
        };
        let admin_approval = match (self.admin_approver_id, self.admin_approved_at) {
            (Some(approver), Some(approved_at)) => Some(AdminApproval {
                approver: UserId::from_uuid(approver),
                approved_at,
                remarks: self.admin_remarks.unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(Event::restore(EventSnapshot {
            id: EventId::from_uuid(self.id),
            organizer: UserId::from_uuid(self.organizer_id),
            details,
            status: EventStatus::from_str(self.status.as_str())?,
            version: self.version,
            registration_count: non_negative("registration_count", self.registration_count)?,
            faculty_review,
            admin_approval,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
            archived_at: self.archived_at,
        }))
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct RegistrationRow {
    id: Uuid,
    student_id: Uuid,
    event_id: Uuid,
    registered_at: DateTime<Utc>,
    attended: bool,
    certificate_issued: bool,
    certificate_url: Option<String>,
}

impl From<RegistrationRow> for Registration {
    fn from(row: RegistrationRow) -> Self {
        Self {
            id: RegistrationId::from_uuid(row.id),
            student: UserId::from_uuid(row.student_id),
            event_id: EventId::from_uuid(row.event_id),
            registered_at: row.registered_at,
            attended: row.attended,
            certificate_issued: row.certificate_issued,
            certificate_url: row.certificate_url,
        }
    }
}

/// Converts a domain count into an INTEGER column value.
pub(crate) fn to_column(column: &str, value: u32) -> AppResult<i32> {
    i32::try_from(value)
        .map_err(|_| AppError::Validation(format!("{column} is too large: {value}")))
}
