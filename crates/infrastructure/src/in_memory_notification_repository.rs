use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use schedly_application::NotificationRepository;
use schedly_core::{AppResult, UserId};
use schedly_domain::{Notification, NotificationId};
use tokio::sync::RwLock;

/// In-memory notification repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryNotificationRepository {
    notifications: RwLock<HashMap<NotificationId, Notification>>,
}

impl InMemoryNotificationRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn create_notification(&self, notification: Notification) -> AppResult<()> {
        self.notifications
            .write()
            .await
            .insert(notification.id, notification);
        Ok(())
    }

    async fn list_for_recipient(
        &self,
        recipient: UserId,
        unread_only: bool,
        limit: usize,
    ) -> AppResult<Vec<Notification>> {
        let notifications = self.notifications.read().await;
        let mut values: Vec<Notification> = notifications
            .values()
            .filter(|notification| notification.recipient == recipient)
            .filter(|notification| !unread_only || !notification.is_read)
            .cloned()
            .collect();

        values.sort_by_key(|notification| Reverse(notification.created_at));
        values.truncate(limit);
        Ok(values)
    }

    async fn count_unread(&self, recipient: UserId) -> AppResult<u64> {
        let count = self
            .notifications
            .read()
            .await
            .values()
            .filter(|notification| notification.recipient == recipient && !notification.is_read)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn find_notification(
        &self,
        notification_id: NotificationId,
    ) -> AppResult<Option<Notification>> {
        Ok(self
            .notifications
            .read()
            .await
            .get(&notification_id)
            .cloned())
    }

    async fn mark_read(
        &self,
        notification_id: NotificationId,
    ) -> AppResult<Option<Notification>> {
        let mut notifications = self.notifications.write().await;
        Ok(notifications.get_mut(&notification_id).map(|notification| {
            notification.is_read = true;
            notification.clone()
        }))
    }

    async fn mark_all_read(&self, recipient: UserId) -> AppResult<u64> {
        let mut changed = 0;
        for notification in self.notifications.write().await.values_mut() {
            if notification.recipient == recipient && !notification.is_read {
                notification.is_read = true;
                changed += 1;
            }
        }

        Ok(changed)
    }

    async fn delete_notification(&self, notification_id: NotificationId) -> AppResult<bool> {
        Ok(self
            .notifications
            .write()
            .await
            .remove(&notification_id)
            .is_some())
    }
}
