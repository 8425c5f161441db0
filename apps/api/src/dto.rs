mod auth;
mod envelope;
mod events;
mod notifications;
mod registrations;

pub use auth::{ActorResponse, EstablishSessionRequest};
pub use envelope::{ApiJson, success, success_message};
pub use events::{
    CreateEventRequest, EventDetailResponse, EventListParams, EventResponse, FacultyReviewRequest,
    RemarksRequest, UpdateEventRequest,
};
pub use notifications::{
    MarkAllReadResponse, NotificationFeedResponse, NotificationListParams, NotificationResponse,
};
pub use registrations::{
    AttendanceRequest, CertificateResponse, CreateRegistrationRequest, IssueCertificateRequest,
    RegistrationResponse, RegistrationWithEventResponse,
};

use serde::Serialize;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}
