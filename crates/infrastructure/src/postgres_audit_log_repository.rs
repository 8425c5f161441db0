use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schedly_application::AuditLogRepository;
use schedly_core::{AppResult, UserId};
use schedly_domain::{AuditLogEntry, EventId};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::postgres_errors::storage_error;

/// PostgreSQL-backed reader for the event audit trail.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditLogRow {
    sequence: i64,
    event_id: Uuid,
    actor_id: Uuid,
    action: String,
    from_status: Option<String>,
    to_status: String,
    remarks: String,
    recorded_at: DateTime<Utc>,
}

impl AuditLogRow {
    fn into_entry(self) -> AppResult<AuditLogEntry> {
        Ok(AuditLogEntry {
            sequence: self.sequence,
            event_id: EventId::from_uuid(self.event_id),
            actor: UserId::from_uuid(self.actor_id),
            action: self.action.parse()?,
            from_status: self.from_status.map(|value| value.parse()).transpose()?,
            to_status: self.to_status.parse()?,
            remarks: self.remarks,
            recorded_at: self.recorded_at,
        })
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn list_for_event(&self, event_id: EventId) -> AppResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT sequence, event_id, actor_id, action, from_status, to_status, remarks, recorded_at
            FROM event_audit_log
            WHERE event_id = $1
            ORDER BY sequence DESC
            "#,
        )
        .bind(event_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            storage_error(
                &format!("failed to list audit entries for event '{event_id}'"),
                error,
            )
        })?;

        rows.into_iter().map(AuditLogRow::into_entry).collect()
    }
}
