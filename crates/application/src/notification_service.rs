use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use schedly_core::{Actor, AppError, AppResult};
use schedly_domain::{NewNotification, Notification, NotificationId};
use tokio::time::timeout;

use crate::NotificationRepository;

/// Maximum number of notifications returned by one listing.
pub const NOTIFICATION_PAGE_SIZE: usize = 50;

/// Notifications visible to a recipient plus their unread total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationFeed {
    /// Newest notifications first.
    pub notifications: Vec<Notification>,
    /// Unread notifications across the whole inbox.
    pub unread_count: u64,
}

/// Application service for in-app notifications.
#[derive(Clone)]
pub struct NotificationService {
    repository: Arc<dyn NotificationRepository>,
    dispatch_timeout: Duration,
}

impl NotificationService {
    /// Creates a notification service.
    #[must_use]
    pub fn new(repository: Arc<dyn NotificationRepository>, dispatch_timeout: Duration) -> Self {
        Self {
            repository,
            dispatch_timeout,
        }
    }

    /// Stores a notification produced by a completed write.
    ///
    /// Failures and timeouts are logged and swallowed; the caller's write
    /// has already been applied.
    pub async fn dispatch(&self, request: NewNotification) {
        let recipient = request.recipient;
        let kind = request.notification_type;
        let notification = Notification {
            id: NotificationId::new(),
            recipient: request.recipient,
            notification_type: request.notification_type,
            title: request.title,
            message: request.message,
            event_id: request.event_id,
            is_read: false,
            link: request.link,
            created_at: Utc::now(),
        };

        match timeout(
            self.dispatch_timeout,
            self.repository.create_notification(notification),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(error)) => tracing::warn!(
                recipient = %recipient,
                notification_type = kind.as_str(),
                error = %error,
                "failed to store notification"
            ),
            Err(_) => tracing::warn!(
                recipient = %recipient,
                notification_type = kind.as_str(),
                timeout_ms = self.dispatch_timeout.as_millis(),
                "timed out storing notification"
            ),
        }
    }

    /// Lists the actor's newest notifications.
    pub async fn list(&self, actor: &Actor, unread_only: bool) -> AppResult<NotificationFeed> {
        let notifications = self
            .repository
            .list_for_recipient(actor.user_id(), unread_only, NOTIFICATION_PAGE_SIZE)
            .await?;
        let unread_count = self.repository.count_unread(actor.user_id()).await?;

        Ok(NotificationFeed {
            notifications,
            unread_count,
        })
    }

    /// Marks one of the actor's notifications read.
    pub async fn mark_read(
        &self,
        actor: &Actor,
        notification_id: NotificationId,
    ) -> AppResult<Notification> {
        self.require_owned(actor, notification_id).await?;
        self.repository
            .mark_read(notification_id)
            .await?
            .ok_or_else(|| missing(notification_id))
    }

    /// Marks all of the actor's notifications read.
    pub async fn mark_all_read(&self, actor: &Actor) -> AppResult<u64> {
        self.repository.mark_all_read(actor.user_id()).await
    }

    /// Deletes one of the actor's notifications.
    pub async fn delete(&self, actor: &Actor, notification_id: NotificationId) -> AppResult<()> {
        self.require_owned(actor, notification_id).await?;
        if !self.repository.delete_notification(notification_id).await? {
            return Err(missing(notification_id));
        }

        Ok(())
    }

    async fn require_owned(&self, actor: &Actor, notification_id: NotificationId) -> AppResult<()> {
        let notification = self
            .repository
            .find_notification(notification_id)
            .await?
            .ok_or_else(|| missing(notification_id))?;

        if notification.recipient != actor.user_id() {
            return Err(AppError::Forbidden(format!(
                "notification '{notification_id}' belongs to another user"
            )));
        }

        Ok(())
    }
}

fn missing(notification_id: NotificationId) -> AppError {
    AppError::NotFound(format!("notification '{notification_id}' does not exist"))
}

#[cfg(test)]
mod tests;
