use chrono::{DateTime, Utc};
use schedly_core::{AppError, AppResult, UserId};
use serde::{Deserialize, Serialize};

use crate::{EventId, RegistrationId};

/// Base location for generated certificate documents.
pub const CERTIFICATE_BASE_URL: &str = "https://certificates.schedly.com";

/// Student enrollment in a published event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Registration identifier.
    pub id: RegistrationId,
    /// Registered student.
    pub student: UserId,
    /// Target event.
    pub event_id: EventId,
    /// Registration timestamp.
    pub registered_at: DateTime<Utc>,
    /// Whether the student attended.
    pub attended: bool,
    /// Whether a certificate has been issued.
    pub certificate_issued: bool,
    /// Certificate location once issued.
    pub certificate_url: Option<String>,
}

impl Registration {
    /// Creates a fresh registration.
    #[must_use]
    pub fn new(student: UserId, event_id: EventId, registered_at: DateTime<Utc>) -> Self {
        Self {
            id: RegistrationId::new(),
            student,
            event_id,
            registered_at,
            attended: false,
            certificate_issued: false,
            certificate_url: None,
        }
    }

    /// Returns the generated certificate location for this registration.
    #[must_use]
    pub fn default_certificate_url(&self) -> String {
        format!("{CERTIFICATE_BASE_URL}/{}.pdf", self.id)
    }

    /// Returns a copy with the attendance flag set.
    ///
    /// Attendance cannot be withdrawn once a certificate has been issued.
    pub fn with_attendance(&self, attended: bool) -> AppResult<Self> {
        if self.certificate_issued && !attended {
            return Err(AppError::InvalidState(format!(
                "registration '{}' already has a certificate",
                self.id
            )));
        }

        Ok(Self {
            attended,
            ..self.clone()
        })
    }

    /// Returns a copy carrying an issued certificate.
    ///
    /// Only attended registrations may receive certificates.
    pub fn with_certificate(&self, url: String) -> AppResult<Self> {
        if !self.attended {
            return Err(AppError::InvalidState(format!(
                "registration '{}' has no recorded attendance",
                self.id
            )));
        }

        Ok(Self {
            certificate_issued: true,
            certificate_url: Some(url),
            ..self.clone()
        })
    }
}
