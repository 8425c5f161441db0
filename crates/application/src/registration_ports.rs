use async_trait::async_trait;
use schedly_core::{AppResult, UserId};
use schedly_domain::{Event, EventId, Registration, RegistrationId};

/// Registration stored together with the updated event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    /// Stored registration.
    pub registration: Registration,
    /// Event after the seat was claimed.
    pub event: Event,
}

/// Registration paired with the event it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationWithEvent {
    /// Stored registration.
    pub registration: Registration,
    /// Target event.
    pub event: Event,
}

/// Outcome of a certificate write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateWriteOutcome {
    /// Certificate fields were written.
    Issued(Registration),
    /// The registration already carried a certificate; nothing changed.
    AlreadyIssued(Registration),
    /// Attendance has not been recorded.
    NotAttended,
    /// The registration does not exist.
    Missing,
}

/// Repository port for registrations.
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Stores a registration and claims one seat on its event in one
    /// serialized step per event.
    ///
    /// Fails, in order of precedence, with `NotFound` when the event is
    /// missing, `InvalidState` when it is not published, `Full` when no
    /// seat remains and `Conflict` when the student is already registered.
    async fn enroll(&self, registration: Registration) -> AppResult<Enrollment>;

    /// Loads a registration by id.
    async fn find_registration(
        &self,
        registration_id: RegistrationId,
    ) -> AppResult<Option<Registration>>;

    /// Deletes a registration and releases its seat, returning the removed row.
    async fn withdraw(&self, registration_id: RegistrationId) -> AppResult<Option<Registration>>;

    /// Sets the attendance flag.
    async fn set_attendance(
        &self,
        registration_id: RegistrationId,
        attended: bool,
    ) -> AppResult<Option<Registration>>;

    /// Writes certificate fields when attendance is recorded.
    async fn record_certificate(
        &self,
        registration_id: RegistrationId,
        certificate_url: String,
    ) -> AppResult<CertificateWriteOutcome>;

    /// Lists a student's registrations with their events, newest first.
    async fn list_for_student(&self, student: UserId) -> AppResult<Vec<RegistrationWithEvent>>;

    /// Lists registrations for an event, newest first.
    async fn list_for_event(&self, event_id: EventId) -> AppResult<Vec<Registration>>;
}
