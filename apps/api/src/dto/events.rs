use chrono::{DateTime, Utc};
use schedly_application::{EventFilters, EventWithAuditTrail};
use schedly_core::{AppError, AppResult};
use schedly_domain::{
    AuditLogEntry, Event, EventCategory, EventDetailsInput, EventDetailsPatch, EventStatus,
    ReviewDecision,
};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

/// Incoming payload for event creation.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-event-request.ts"
)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[ts(type = "string")]
    pub start_date: DateTime<Utc>,
    #[ts(type = "string")]
    pub end_date: DateTime<Utc>,
    pub venue: String,
    pub capacity: i64,
    pub banner_url: Option<String>,
}

impl TryFrom<CreateEventRequest> for EventDetailsInput {
    type Error = AppError;

    fn try_from(request: CreateEventRequest) -> AppResult<Self> {
        Ok(Self {
            title: request.title,
            description: request.description,
            category: request.category.parse()?,
            tags: request.tags,
            starts_at: request.start_date,
            ends_at: request.end_date,
            venue: request.venue,
            capacity: capacity(request.capacity)?,
            banner_url: request.banner_url,
        })
    }
}

/// Partial update for a draft event. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-event-request.ts"
)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    #[ts(type = "string | null")]
    pub start_date: Option<DateTime<Utc>>,
    #[ts(type = "string | null")]
    pub end_date: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    pub capacity: Option<i64>,
    /// `null` clears the banner.
    #[serde(default, deserialize_with = "present")]
    #[ts(type = "string | null")]
    pub banner_url: Option<Option<String>>,
    pub remarks: Option<String>,
}

impl UpdateEventRequest {
    /// Splits the request into the details patch and the audit remarks.
    pub fn into_patch(self) -> AppResult<(EventDetailsPatch, Option<String>)> {
        let patch = EventDetailsPatch {
            title: self.title,
            description: self.description,
            category: self
                .category
                .as_deref()
                .map(str::parse::<EventCategory>)
                .transpose()?,
            tags: self.tags,
            starts_at: self.start_date,
            ends_at: self.end_date,
            venue: self.venue,
            capacity: self.capacity.map(capacity).transpose()?,
            banner_url: self.banner_url,
        };

        Ok((patch, self.remarks))
    }
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn capacity(value: i64) -> AppResult<u32> {
    u32::try_from(value)
        .map_err(|_| AppError::Validation(format!("capacity must be a positive integer, got {value}")))
}

/// Optional remarks attached to a lifecycle action.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/remarks-request.ts"
)]
pub struct RemarksRequest {
    pub remarks: Option<String>,
}

/// Faculty review decision payload.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/faculty-review-request.ts"
)]
pub struct FacultyReviewRequest {
    /// `approve` or `reject`.
    pub action: String,
    pub remarks: Option<String>,
}

impl FacultyReviewRequest {
    pub fn decision(&self) -> AppResult<ReviewDecision> {
        self.action.parse()
    }
}

/// Query filters for event listing.
#[derive(Debug, Default, Deserialize)]
pub struct EventListParams {
    pub category: Option<String>,
    pub status: Option<String>,
}

impl TryFrom<EventListParams> for EventFilters {
    type Error = AppError;

    fn try_from(params: EventListParams) -> AppResult<Self> {
        Ok(Self {
            category: params
                .category
                .as_deref()
                .map(str::parse::<EventCategory>)
                .transpose()?,
            status: params
                .status
                .as_deref()
                .map(str::parse::<EventStatus>)
                .transpose()?,
        })
    }
}

/// Recorded faculty or admin decision.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/decision-response.ts"
)]
pub struct DecisionResponse {
    pub decided_by: String,
    pub decided_at: String,
    pub remarks: String,
}

/// API representation of an event.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/event-response.ts"
)]
pub struct EventResponse {
    pub id: String,
    pub organizer_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub start_date: String,
    pub end_date: String,
    pub venue: String,
    pub capacity: u32,
    pub registration_count: u32,
    pub is_full: bool,
    pub banner_url: Option<String>,
    pub status: String,
    pub faculty_review: Option<DecisionResponse>,
    pub admin_approval: Option<DecisionResponse>,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
    pub archived_at: Option<String>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        let details = event.details();
        Self {
            id: event.id().to_string(),
            organizer_id: event.organizer().to_string(),
            title: details.title().to_owned(),
            description: details.description().to_owned(),
            category: details.category().as_str().to_owned(),
            tags: details.tags().to_vec(),
            start_date: details.starts_at().to_rfc3339(),
            end_date: details.ends_at().to_rfc3339(),
            venue: details.venue().to_owned(),
            capacity: details.capacity(),
            registration_count: event.registration_count(),
            is_full: event.is_full(),
            banner_url: details.banner_url().map(ToOwned::to_owned),
            status: event.status().label().to_owned(),
            faculty_review: event.faculty_review().map(|review| DecisionResponse {
                decided_by: review.reviewer.to_string(),
                decided_at: review.reviewed_at.to_rfc3339(),
                remarks: review.remarks.clone(),
            }),
            admin_approval: event.admin_approval().map(|approval| DecisionResponse {
                decided_by: approval.approver.to_string(),
                decided_at: approval.approved_at.to_rfc3339(),
                remarks: approval.remarks.clone(),
            }),
            created_at: event.created_at().to_rfc3339(),
            updated_at: event.updated_at().to_rfc3339(),
            completed_at: event.completed_at().map(|at| at.to_rfc3339()),
            archived_at: event.archived_at().map(|at| at.to_rfc3339()),
        }
    }
}

/// API representation of one audit trail entry.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/audit-entry-response.ts"
)]
pub struct AuditEntryResponse {
    pub actor_id: String,
    pub action: String,
    pub from_status: Option<String>,
    pub to_status: String,
    pub remarks: String,
    pub timestamp: String,
}

impl From<AuditLogEntry> for AuditEntryResponse {
    fn from(entry: AuditLogEntry) -> Self {
        Self {
            actor_id: entry.actor.to_string(),
            action: entry.action.as_str().to_owned(),
            from_status: entry.from_status.map(|status| status.label().to_owned()),
            to_status: entry.to_status.label().to_owned(),
            remarks: entry.remarks,
            timestamp: entry.recorded_at.to_rfc3339(),
        }
    }
}

/// Event with its newest-first audit trail.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/event-detail-response.ts"
)]
pub struct EventDetailResponse {
    pub event: EventResponse,
    pub audit_trail: Vec<AuditEntryResponse>,
}

impl From<EventWithAuditTrail> for EventDetailResponse {
    fn from(value: EventWithAuditTrail) -> Self {
        Self {
            event: EventResponse::from(value.event),
            audit_trail: value
                .audit_trail
                .into_iter()
                .map(AuditEntryResponse::from)
                .collect(),
        }
    }
}
