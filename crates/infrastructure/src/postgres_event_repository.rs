use async_trait::async_trait;
use schedly_application::{ConditionalWrite, EventListQuery, EventRepository};
use schedly_core::AppResult;
use schedly_domain::{
    Event, EventId, EventStatus, EventTransition, EventVisibility, NewAuditEntry,
};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::postgres_errors::storage_error;
use crate::postgres_rows::{EVENT_COLUMNS, EventRow, to_column};

/// PostgreSQL-backed event repository.
///
/// Transitions run as `UPDATE ... WHERE status = expected` followed by the
/// audit insert inside one transaction.
#[derive(Clone)]
pub struct PostgresEventRepository {
    pool: PgPool,
}

impl PostgresEventRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self, context: &str) -> AppResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|error| storage_error(&format!("failed to start {context} transaction"), error))
    }
}

async fn insert_audit_entry(
    transaction: &mut Transaction<'static, Postgres>,
    entry: &NewAuditEntry,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO event_audit_log (
            event_id, actor_id, action, from_status, to_status, remarks, recorded_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(entry.event_id.as_uuid())
    .bind(entry.actor.as_uuid())
    .bind(entry.action.as_str())
    .bind(entry.from_status.map(|status| status.as_str()))
    .bind(entry.to_status.as_str())
    .bind(entry.remarks.as_str())
    .bind(entry.recorded_at)
    .execute(&mut **transaction)
    .await
    .map_err(|error| {
        storage_error(
            &format!("failed to append audit entry for event '{}'", entry.event_id),
            error,
        )
    })?;

    Ok(())
}

async fn current_state(
    transaction: &mut Transaction<'static, Postgres>,
    event_id: EventId,
) -> AppResult<Option<(EventStatus, i64)>> {
    let state = sqlx::query_as::<_, (String, i64)>(
        "SELECT status, version FROM events WHERE id = $1",
    )
    .bind(event_id.as_uuid())
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| storage_error(&format!("failed to read state of event '{event_id}'"), error))?;

    state
        .map(|(status, version)| {
            status
                .parse::<EventStatus>()
                .map(|status| (status, version))
        })
        .transpose()
}

/// Classifies a conditional write that matched no row.
async fn missed_write<T>(
    transaction: &mut Transaction<'static, Postgres>,
    event_id: EventId,
) -> AppResult<ConditionalWrite<T>> {
    Ok(match current_state(transaction, event_id).await? {
        Some((status, version)) => ConditionalWrite::Stale { status, version },
        None => ConditionalWrite::Missing,
    })
}

#[async_trait]
impl EventRepository for PostgresEventRepository {
    async fn insert_event(&self, event: Event, audit: NewAuditEntry) -> AppResult<()> {
        let mut transaction = self.begin("event create").await?;
        let details = event.details();

        sqlx::query(
            r#"
            INSERT INTO events (
                id, organizer_id, title, description, category, tags, starts_at, ends_at,
                venue, capacity, registration_count, banner_url, status, version, created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(event.id().as_uuid())
        .bind(event.organizer().as_uuid())
        .bind(details.title())
        .bind(details.description())
        .bind(details.category().as_str())
        .bind(details.tags().to_vec())
        .bind(details.starts_at())
        .bind(details.ends_at())
        .bind(details.venue())
        .bind(to_column("capacity", details.capacity())?)
        .bind(to_column("registration_count", event.registration_count())?)
        .bind(details.banner_url())
        .bind(event.status().as_str())
        .bind(event.version())
        .bind(event.created_at())
        .bind(event.updated_at())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            storage_error(&format!("failed to insert event '{}'", event.id()), error)
        })?;

        insert_audit_entry(&mut transaction, &audit).await?;

        transaction.commit().await.map_err(|error| {
            storage_error(
                &format!("failed to commit creation of event '{}'", event.id()),
                error,
            )
        })
    }

    async fn find_event(&self, event_id: EventId) -> AppResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(event_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| storage_error(&format!("failed to load event '{event_id}'"), error))?;

        row.map(EventRow::into_event).transpose()
    }

    async fn list_events(&self, query: &EventListQuery) -> AppResult<Vec<Event>> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events WHERE TRUE"));

        match query.visibility {
            EventVisibility::All => {}
            EventVisibility::OrganizedBy(organizer) => {
                builder
                    .push(" AND organizer_id = ")
                    .push_bind(organizer.as_uuid());
            }
            EventVisibility::Statuses(statuses) => {
                let values: Vec<String> = statuses
                    .iter()
                    .map(|status| status.as_str().to_owned())
                    .collect();
                builder.push(" AND status = ANY(").push_bind(values).push(")");
            }
        }

        if let Some(category) = query.category {
            builder
                .push(" AND category = ")
                .push_bind(category.as_str());
        }
        if let Some(status) = query.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        builder.push(" ORDER BY created_at DESC");

        let rows = builder
            .build_query_as::<EventRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| storage_error("failed to list events", error))?;

        rows.into_iter().map(EventRow::into_event).collect()
    }

    async fn apply_transition(
        &self,
        transition: EventTransition,
    ) -> AppResult<ConditionalWrite<Event>> {
        let event = &transition.event;
        let details = event.details();
        let mut transaction = self.begin("event transition").await?;

        let updated = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            UPDATE events
            SET
                title = $3,
                description = $4,
                category = $5,
                tags = $6,
                starts_at = $7,
                ends_at = $8,
                venue = $9,
                capacity = $10,
                banner_url = $11,
                status = $12,
                faculty_reviewer_id = $13,
                faculty_reviewed_at = $14,
                faculty_remarks = $15,
                admin_approver_id = $16,
                admin_approved_at = $17,
                admin_remarks = $18,
                updated_at = $19,
                completed_at = $20,
                archived_at = $21,
                version = $22
            WHERE id = $1 AND status = $2 AND version = $23
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event.id().as_uuid())
        .bind(transition.expected_status.as_str())
        .bind(details.title())
        .bind(details.description())
        .bind(details.category().as_str())
        .bind(details.tags().to_vec())
        .bind(details.starts_at())
        .bind(details.ends_at())
        .bind(details.venue())
        .bind(to_column("capacity", details.capacity())?)
        .bind(details.banner_url())
        .bind(event.status().as_str())
        .bind(event.faculty_review().map(|review| review.reviewer.as_uuid()))
        .bind(event.faculty_review().map(|review| review.reviewed_at))
        .bind(event.faculty_review().map(|review| review.remarks.as_str()))
        .bind(event.admin_approval().map(|approval| approval.approver.as_uuid()))
        .bind(event.admin_approval().map(|approval| approval.approved_at))
        .bind(event.admin_approval().map(|approval| approval.remarks.as_str()))
        .bind(event.updated_at())
        .bind(event.completed_at())
        .bind(event.archived_at())
        .bind(event.version())
        .bind(transition.expected_version)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| {
            storage_error(
                &format!("failed to apply transition to event '{}'", event.id()),
                error,
            )
        })?;

        let Some(row) = updated else {
            return missed_write(&mut transaction, event.id()).await;
        };

        insert_audit_entry(&mut transaction, &transition.audit).await?;
        transaction.commit().await.map_err(|error| {
            storage_error(
                &format!("failed to commit transition of event '{}'", event.id()),
                error,
            )
        })?;

        row.into_event().map(ConditionalWrite::Applied)
    }

    async fn delete_event(
        &self,
        event_id: EventId,
        expected_status: EventStatus,
    ) -> AppResult<ConditionalWrite<()>> {
        let mut transaction = self.begin("event delete").await?;

        let deleted: Option<Uuid> = sqlx::query_scalar(
            "DELETE FROM events WHERE id = $1 AND status = $2 RETURNING id",
        )
        .bind(event_id.as_uuid())
        .bind(expected_status.as_str())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| storage_error(&format!("failed to delete event '{event_id}'"), error))?;

        if deleted.is_none() {
            return missed_write(&mut transaction, event_id).await;
        }

        transaction.commit().await.map_err(|error| {
            storage_error(
                &format!("failed to commit deletion of event '{event_id}'"),
                error,
            )
        })?;

        Ok(ConditionalWrite::Applied(()))
    }
}

#[cfg(test)]
mod tests;
