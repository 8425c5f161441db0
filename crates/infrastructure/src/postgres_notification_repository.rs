use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schedly_application::NotificationRepository;
use schedly_core::{AppResult, UserId};
use schedly_domain::{EventId, Notification, NotificationId};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::postgres_errors::storage_error;

const NOTIFICATION_COLUMNS: &str =
    "id, recipient_id, notification_type, title, message, event_id, is_read, link, created_at";

/// PostgreSQL-backed notification repository.
#[derive(Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    recipient_id: Uuid,
    notification_type: String,
    title: String,
    message: String,
    event_id: Option<Uuid>,
    is_read: bool,
    link: Option<String>,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_notification(self) -> AppResult<Notification> {
        Ok(Notification {
            id: NotificationId::from_uuid(self.id),
            recipient: UserId::from_uuid(self.recipient_id),
            notification_type: self.notification_type.parse()?,
            title: self.title,
            message: self.message,
            event_id: self.event_id.map(EventId::from_uuid),
            is_read: self.is_read,
            link: self.link,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn create_notification(&self, notification: Notification) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, recipient_id, notification_type, title, message, event_id, is_read, link, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(notification.id.as_uuid())
        .bind(notification.recipient.as_uuid())
        .bind(notification.notification_type.as_str())
        .bind(notification.title.as_str())
        .bind(notification.message.as_str())
        .bind(notification.event_id.map(|event_id| event_id.as_uuid()))
        .bind(notification.is_read)
        .bind(notification.link.as_deref())
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(|error| storage_error("failed to store notification", error))?;

        Ok(())
    }

    async fn list_for_recipient(
        &self,
        recipient: UserId,
        unread_only: bool,
        limit: usize,
    ) -> AppResult<Vec<Notification>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM notifications
            WHERE recipient_id = $1 AND (NOT $2 OR NOT is_read)
            ORDER BY created_at DESC
            LIMIT $3
            "#
        ))
        .bind(recipient.as_uuid())
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            storage_error(
                &format!("failed to list notifications for '{recipient}'"),
                error,
            )
        })?;

        rows.into_iter()
            .map(NotificationRow::into_notification)
            .collect()
    }

    async fn count_unread(&self, recipient: UserId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND NOT is_read",
        )
        .bind(recipient.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            storage_error(
                &format!("failed to count unread notifications for '{recipient}'"),
                error,
            )
        })?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn find_notification(
        &self,
        notification_id: NotificationId,
    ) -> AppResult<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(notification_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            storage_error(
                &format!("failed to load notification '{notification_id}'"),
                error,
            )
        })?;

        row.map(NotificationRow::into_notification).transpose()
    }

    async fn mark_read(
        &self,
        notification_id: NotificationId,
    ) -> AppResult<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "UPDATE notifications SET is_read = TRUE WHERE id = $1 RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(notification_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            storage_error(
                &format!("failed to mark notification '{notification_id}' as read"),
                error,
            )
        })?;

        row.map(NotificationRow::into_notification).transpose()
    }

    async fn mark_all_read(&self, recipient: UserId) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE recipient_id = $1 AND NOT is_read",
        )
        .bind(recipient.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            storage_error(
                &format!("failed to mark notifications for '{recipient}' as read"),
                error,
            )
        })?;

        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, notification_id: NotificationId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(notification_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                storage_error(
                    &format!("failed to delete notification '{notification_id}'"),
                    error,
                )
            })?;

        Ok(result.rows_affected() > 0)
    }
}
