use std::sync::Arc;

use chrono::Utc;
use schedly_core::{Actor, AppError, AppResult, UserId};
use schedly_domain::{Capability, Event, EventId, NewNotification, Registration, RegistrationId};

use crate::authorization::{require_capability, require_scope};
use crate::retry::{RetryPolicy, retry_transient};
use crate::{
    CertificateWriteOutcome, EventRepository, NotificationService, RegistrationRepository,
    RegistrationWithEvent,
};

/// Certificate details readable by the student or event staff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateView {
    /// Registration the certificate belongs to.
    pub registration_id: RegistrationId,
    /// Certificate location.
    pub certificate_url: String,
    /// Certified student.
    pub student: UserId,
    /// Event the certificate covers.
    pub event_id: EventId,
    /// Event title.
    pub event_title: String,
}

/// Application service for student registrations and certificates.
#[derive(Clone)]
pub struct RegistrationService {
    registrations: Arc<dyn RegistrationRepository>,
    events: Arc<dyn EventRepository>,
    notifications: NotificationService,
    retry_policy: RetryPolicy,
}

impl RegistrationService {
    /// Creates a registration service.
    #[must_use]
    pub fn new(
        registrations: Arc<dyn RegistrationRepository>,
        events: Arc<dyn EventRepository>,
        notifications: NotificationService,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            registrations,
            events,
            notifications,
            retry_policy,
        }
    }

    /// Registers the acting student for a published event.
    pub async fn register(&self, actor: &Actor, event_id: EventId) -> AppResult<Registration> {
        require_capability(actor, Capability::RegisterForEvent)?;
        let registration = Registration::new(actor.user_id(), event_id, Utc::now());

        let registrations = self.registrations.clone();
        let enrollment = retry_transient(self.retry_policy, move || {
            let registrations = registrations.clone();
            let registration = registration.clone();
            async move { registrations.enroll(registration).await }
        })
        .await?;

        tracing::info!(
            event_id = %event_id,
            student = %actor.user_id(),
            registration_id = %enrollment.registration.id,
            registration_count = enrollment.event.registration_count(),
            "student registered"
        );

        self.notifications
            .dispatch(NewNotification::registered(
                actor.user_id(),
                event_id,
                enrollment.event.details().title(),
            ))
            .await;

        Ok(enrollment.registration)
    }

    /// Cancels one of the acting student's registrations.
    pub async fn cancel(&self, actor: &Actor, registration_id: RegistrationId) -> AppResult<()> {
        let scope = require_capability(actor, Capability::CancelRegistration)?;
        let registration = self.load_registration(registration_id).await?;
        require_scope(
            actor,
            scope,
            registration.student,
            Capability::CancelRegistration,
        )?;

        if self.registrations.withdraw(registration_id).await?.is_none() {
            return Err(registration_not_found(registration_id));
        }

        tracing::info!(
            registration_id = %registration_id,
            event_id = %registration.event_id,
            student = %registration.student,
            "registration cancelled"
        );
        Ok(())
    }

    /// Records attendance for a registration.
    ///
    /// Clearing attendance on a registration that already holds a
    /// certificate fails with `InvalidState`.
    pub async fn mark_attendance(
        &self,
        actor: &Actor,
        registration_id: RegistrationId,
        attended: bool,
    ) -> AppResult<Registration> {
        let registration = self.load_registration(registration_id).await?;
        self.require_manager(actor, registration.event_id).await?;
        registration.with_attendance(attended)?;

        self.registrations
            .set_attendance(registration_id, attended)
            .await?
            .ok_or_else(|| registration_not_found(registration_id))
    }

    /// Issues a certificate for an attended registration and notifies the student.
    ///
    /// Issuing again returns the stored registration unchanged.
    pub async fn issue_certificate(
        &self,
        actor: &Actor,
        registration_id: RegistrationId,
        certificate_url: Option<String>,
    ) -> AppResult<Registration> {
        let registration = self.load_registration(registration_id).await?;
        let event = self.require_manager(actor, registration.event_id).await?;

        let url = certificate_url
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| registration.default_certificate_url());

        match self
            .registrations
            .record_certificate(registration_id, url)
            .await?
        {
            CertificateWriteOutcome::Issued(issued) => {
                tracing::info!(
                    registration_id = %registration_id,
                    event_id = %issued.event_id,
                    "certificate issued"
                );
                self.notifications
                    .dispatch(NewNotification::certificate_issued(
                        issued.student,
                        issued.event_id,
                        event.details().title(),
                    ))
                    .await;
                Ok(issued)
            }
            CertificateWriteOutcome::AlreadyIssued(existing) => Ok(existing),
            CertificateWriteOutcome::NotAttended => Err(AppError::InvalidState(format!(
                "registration '{registration_id}' has no recorded attendance"
            ))),
            CertificateWriteOutcome::Missing => Err(registration_not_found(registration_id)),
        }
    }

    /// Returns certificate details for an issued certificate.
    pub async fn certificate(
        &self,
        actor: &Actor,
        registration_id: RegistrationId,
    ) -> AppResult<CertificateView> {
        let scope = require_capability(actor, Capability::ViewCertificate)?;
        let registration = self.load_registration(registration_id).await?;
        require_scope(
            actor,
            scope,
            registration.student,
            Capability::ViewCertificate,
        )?;

        let certificate_url = registration
            .certificate_url
            .clone()
            .filter(|_| registration.certificate_issued)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "no certificate has been issued for registration '{registration_id}'"
                ))
            })?;
        let event = self.load_event(registration.event_id).await?;

        Ok(CertificateView {
            registration_id,
            certificate_url,
            student: registration.student,
            event_id: registration.event_id,
            event_title: event.details().title().to_owned(),
        })
    }

    /// Lists the acting student's registrations, newest first.
    pub async fn list_my_registrations(
        &self,
        actor: &Actor,
    ) -> AppResult<Vec<RegistrationWithEvent>> {
        require_capability(actor, Capability::ViewOwnRegistrations)?;
        self.registrations.list_for_student(actor.user_id()).await
    }

    /// Lists registrations for an event managed by the actor.
    pub async fn list_event_registrations(
        &self,
        actor: &Actor,
        event_id: EventId,
    ) -> AppResult<Vec<Registration>> {
        self.require_manager(actor, event_id).await?;
        self.registrations.list_for_event(event_id).await
    }

    /// Ensures the actor may manage registrations of `event_id` and returns the event.
    async fn require_manager(&self, actor: &Actor, event_id: EventId) -> AppResult<Event> {
        let scope = require_capability(actor, Capability::ManageRegistrations)?;
        let event = self.load_event(event_id).await?;
        require_scope(
            actor,
            scope,
            event.organizer(),
            Capability::ManageRegistrations,
        )?;

        Ok(event)
    }

    async fn load_registration(&self, registration_id: RegistrationId) -> AppResult<Registration> {
        self.registrations
            .find_registration(registration_id)
            .await?
            .ok_or_else(|| registration_not_found(registration_id))
    }

    async fn load_event(&self, event_id: EventId) -> AppResult<Event> {
        self.events
            .find_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("event '{event_id}' does not exist")))
    }
}

fn registration_not_found(registration_id: RegistrationId) -> AppError {
    AppError::NotFound(format!(
        "registration '{registration_id}' does not exist"
    ))
}
