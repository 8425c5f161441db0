use schedly_application::{CertificateView, RegistrationWithEvent};
use schedly_domain::{Event, Registration};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Student registration payload.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-registration-request.ts"
)]
pub struct CreateRegistrationRequest {
    pub event_id: String,
}

/// Attendance update payload.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/attendance-request.ts"
)]
pub struct AttendanceRequest {
    pub attended: bool,
}

/// Certificate issuance payload. Without a URL the generated location is used.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/issue-certificate-request.ts"
)]
pub struct IssueCertificateRequest {
    pub certificate_url: Option<String>,
}

/// API representation of a registration.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/registration-response.ts"
)]
pub struct RegistrationResponse {
    pub id: String,
    pub student_id: String,
    pub event_id: String,
    pub registered_at: String,
    pub attended: bool,
    pub certificate_issued: bool,
    pub certificate_url: Option<String>,
}

impl From<Registration> for RegistrationResponse {
    fn from(registration: Registration) -> Self {
        Self {
            id: registration.id.to_string(),
            student_id: registration.student.to_string(),
            event_id: registration.event_id.to_string(),
            registered_at: registration.registered_at.to_rfc3339(),
            attended: registration.attended,
            certificate_issued: registration.certificate_issued,
            certificate_url: registration.certificate_url,
        }
    }
}

/// Event fields shown next to a student's registration.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/event-summary-response.ts"
)]
pub struct EventSummaryResponse {
    pub id: String,
    pub title: String,
    pub category: String,
    pub start_date: String,
    pub end_date: String,
    pub venue: String,
    pub status: String,
}

impl From<&Event> for EventSummaryResponse {
    fn from(event: &Event) -> Self {
        let details = event.details();
        Self {
            id: event.id().to_string(),
            title: details.title().to_owned(),
            category: details.category().as_str().to_owned(),
            start_date: details.starts_at().to_rfc3339(),
            end_date: details.ends_at().to_rfc3339(),
            venue: details.venue().to_owned(),
            status: event.status().label().to_owned(),
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/registration-with-event-response.ts"
)]
pub struct RegistrationWithEventResponse {
    #[serde(flatten)]
    pub registration: RegistrationResponse,
    pub event: EventSummaryResponse,
}

impl From<RegistrationWithEvent> for RegistrationWithEventResponse {
    fn from(value: RegistrationWithEvent) -> Self {
        Self {
            event: EventSummaryResponse::from(&value.event),
            registration: RegistrationResponse::from(value.registration),
        }
    }
}

/// Issued certificate details.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/certificate-response.ts"
)]
pub struct CertificateResponse {
    pub registration_id: String,
    pub certificate_url: String,
    pub student_id: String,
    pub event_id: String,
    pub event_title: String,
}

impl From<CertificateView> for CertificateResponse {
    fn from(view: CertificateView) -> Self {
        Self {
            registration_id: view.registration_id.to_string(),
            certificate_url: view.certificate_url,
            student_id: view.student.to_string(),
            event_id: view.event_id.to_string(),
            event_title: view.event_title,
        }
    }
}
