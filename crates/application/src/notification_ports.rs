use async_trait::async_trait;
use schedly_core::{AppResult, UserId};
use schedly_domain::{Notification, NotificationId};

/// Repository port for in-app notifications.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Stores a notification.
    async fn create_notification(&self, notification: Notification) -> AppResult<()>;

    /// Lists notifications for a recipient, newest first.
    async fn list_for_recipient(
        &self,
        recipient: UserId,
        unread_only: bool,
        limit: usize,
    ) -> AppResult<Vec<Notification>>;

    /// Counts unread notifications for a recipient.
    async fn count_unread(&self, recipient: UserId) -> AppResult<u64>;

    /// Loads a notification by id.
    async fn find_notification(
        &self,
        notification_id: NotificationId,
    ) -> AppResult<Option<Notification>>;

    /// Marks one notification read and returns it.
    async fn mark_read(&self, notification_id: NotificationId)
    -> AppResult<Option<Notification>>;

    /// Marks every notification of a recipient read. Returns how many changed.
    async fn mark_all_read(&self, recipient: UserId) -> AppResult<u64>;

    /// Deletes a notification. Returns whether a row was removed.
    async fn delete_notification(&self, notification_id: NotificationId) -> AppResult<bool>;
}
