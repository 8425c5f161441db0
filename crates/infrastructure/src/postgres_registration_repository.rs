use std::collections::HashMap;

use async_trait::async_trait;
use schedly_application::{
    CertificateWriteOutcome, Enrollment, RegistrationRepository, RegistrationWithEvent,
};
use schedly_core::{AppError, AppResult, UserId};
use schedly_domain::{Event, EventId, Registration, RegistrationId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::postgres_errors::{is_unique_violation, storage_error};
use crate::postgres_rows::{EVENT_COLUMNS, EventRow, REGISTRATION_COLUMNS, RegistrationRow};

/// PostgreSQL-backed registration repository.
///
/// Enrollment locks the event row (`SELECT ... FOR UPDATE`) so capacity
/// checks and count increments for one event are serialized.
#[derive(Clone)]
pub struct PostgresRegistrationRepository {
    pool: PgPool,
}

impl PostgresRegistrationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_registration(
        &self,
        registration_id: RegistrationId,
    ) -> AppResult<Option<Registration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1"
        ))
        .bind(registration_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            storage_error(
                &format!("failed to load registration '{registration_id}'"),
                error,
            )
        })?;

        Ok(row.map(Registration::from))
    }
}

#[async_trait]
impl RegistrationRepository for PostgresRegistrationRepository {
    async fn enroll(&self, registration: Registration) -> AppResult<Enrollment> {
        let event_id = registration.event_id;
        let mut transaction = self.pool.begin().await.map_err(|error| {
            storage_error("failed to start registration transaction", error)
        })?;

        let event_row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"
        ))
        .bind(event_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| storage_error(&format!("failed to lock event '{event_id}'"), error))?
        .ok_or_else(|| AppError::NotFound(format!("event '{event_id}' does not exist")))?;

        let event = event_row.into_event()?.admit_registration()?;

        let already_registered: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM registrations WHERE student_id = $1 AND event_id = $2
            )
            "#,
        )
        .bind(registration.student.as_uuid())
        .bind(event_id.as_uuid())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| storage_error("failed to check existing registration", error))?;

        if already_registered {
            return Err(duplicate(registration.student, event_id));
        }

        sqlx::query(
            r#"
            INSERT INTO registrations (
                id, student_id, event_id, registered_at, attended, certificate_issued, certificate_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(registration.id.as_uuid())
        .bind(registration.student.as_uuid())
        .bind(event_id.as_uuid())
        .bind(registration.registered_at)
        .bind(registration.attended)
        .bind(registration.certificate_issued)
        .bind(registration.certificate_url.as_deref())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            if is_unique_violation(&error) {
                return duplicate(registration.student, event_id);
            }
            storage_error("failed to insert registration", error)
        })?;

        sqlx::query(
            "UPDATE events SET registration_count = registration_count + 1 WHERE id = $1",
        )
        .bind(event_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            storage_error(
                &format!("failed to claim seat on event '{event_id}'"),
                error,
            )
        })?;

        transaction
            .commit()
            .await
            .map_err(|error| storage_error("failed to commit registration", error))?;

        Ok(Enrollment {
            registration,
            event,
        })
    }

    async fn find_registration(
        &self,
        registration_id: RegistrationId,
    ) -> AppResult<Option<Registration>> {
        self.fetch_registration(registration_id).await
    }

    async fn withdraw(&self, registration_id: RegistrationId) -> AppResult<Option<Registration>> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            storage_error("failed to start cancellation transaction", error)
        })?;

        let Some(row) = sqlx::query_as::<_, RegistrationRow>(&format!(
            "DELETE FROM registrations WHERE id = $1 RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(registration_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| {
            storage_error(
                &format!("failed to delete registration '{registration_id}'"),
                error,
            )
        })?
        else {
            return Ok(None);
        };
        let registration = Registration::from(row);

        sqlx::query(
            r#"
            UPDATE events
            SET registration_count = GREATEST(registration_count - 1, 0)
            WHERE id = $1
            "#,
        )
        .bind(registration.event_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            storage_error(
                &format!("failed to release seat on event '{}'", registration.event_id),
                error,
            )
        })?;

        transaction
            .commit()
            .await
            .map_err(|error| storage_error("failed to commit cancellation", error))?;

        Ok(Some(registration))
    }

    async fn set_attendance(
        &self,
        registration_id: RegistrationId,
        attended: bool,
    ) -> AppResult<Option<Registration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            r#"
            UPDATE registrations
            SET attended = $2
            WHERE id = $1 AND ($2 OR NOT certificate_issued)
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(registration_id.as_uuid())
        .bind(attended)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            storage_error(
                &format!("failed to record attendance for '{registration_id}'"),
                error,
            )
        })?;

        if let Some(row) = row {
            return Ok(Some(Registration::from(row)));
        }

        // the guard only rejects certified rows, so a surviving row is certified
        match self.find_registration(registration_id).await? {
            Some(_) => Err(AppError::InvalidState(format!(
                "registration '{registration_id}' already has a certificate"
            ))),
            None => Ok(None),
        }
    }

    async fn record_certificate(
        &self,
        registration_id: RegistrationId,
        certificate_url: String,
    ) -> AppResult<CertificateWriteOutcome> {
        let issued = sqlx::query_as::<_, RegistrationRow>(&format!(
            r#"
            UPDATE registrations
            SET certificate_issued = TRUE, certificate_url = $2
            WHERE id = $1 AND attended AND NOT certificate_issued
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(registration_id.as_uuid())
        .bind(certificate_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            storage_error(
                &format!("failed to issue certificate for '{registration_id}'"),
                error,
            )
        })?;

        if let Some(row) = issued {
            return Ok(CertificateWriteOutcome::Issued(Registration::from(row)));
        }

        Ok(match self.fetch_registration(registration_id).await? {
            None => CertificateWriteOutcome::Missing,
            Some(existing) if existing.certificate_issued => {
                CertificateWriteOutcome::AlreadyIssued(existing)
            }
            Some(_) => CertificateWriteOutcome::NotAttended,
        })
    }

    async fn list_for_student(&self, student: UserId) -> AppResult<Vec<RegistrationWithEvent>> {
        let registrations: Vec<Registration> = sqlx::query_as::<_, RegistrationRow>(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS}
            FROM registrations
            WHERE student_id = $1
            ORDER BY registered_at DESC
            "#
        ))
        .bind(student.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            storage_error(
                &format!("failed to list registrations for student '{student}'"),
                error,
            )
        })?
        .into_iter()
        .map(Registration::from)
        .collect();

        let event_ids: Vec<Uuid> = registrations
            .iter()
            .map(|registration| registration.event_id.as_uuid())
            .collect();
        let events: HashMap<EventId, Event> = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = ANY($1)"
        ))
        .bind(event_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| storage_error("failed to load registered events", error))?
        .into_iter()
        .map(|row| row.into_event().map(|event| (event.id(), event)))
        .collect::<AppResult<_>>()?;

        Ok(registrations
            .into_iter()
            .filter_map(|registration| {
                events
                    .get(&registration.event_id)
                    .cloned()
                    .map(|event| RegistrationWithEvent {
                        registration,
                        event,
                    })
            })
            .collect())
    }

    async fn list_for_event(&self, event_id: EventId) -> AppResult<Vec<Registration>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS}
            FROM registrations
            WHERE event_id = $1
            ORDER BY registered_at DESC
            "#
        ))
        .bind(event_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            storage_error(
                &format!("failed to list registrations for event '{event_id}'"),
                error,
            )
        })?;

        Ok(rows.into_iter().map(Registration::from).collect())
    }
}

fn duplicate(student: UserId, event_id: EventId) -> AppError {
    AppError::Conflict(format!(
        "student '{student}' is already registered for event '{event_id}'"
    ))
}
