use schedly_application::NotificationFeed;
use schedly_domain::Notification;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Query parameters for the notification feed.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationListParams {
    #[serde(default)]
    pub unread_only: bool,
}

/// API representation of a notification.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/notification-response.ts"
)]
pub struct NotificationResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub event_id: Option<String>,
    pub is_read: bool,
    pub link: Option<String>,
    pub created_at: String,
}

impl From<Notification> for NotificationResponse {
    fn from(notification: Notification) -> Self {
        Self {
            id: notification.id.to_string(),
            notification_type: notification.notification_type.as_str().to_owned(),
            title: notification.title,
            message: notification.message,
            event_id: notification.event_id.map(|event_id| event_id.to_string()),
            is_read: notification.is_read,
            link: notification.link,
            created_at: notification.created_at.to_rfc3339(),
        }
    }
}

/// Newest notifications plus the recipient's unread total.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/notification-feed-response.ts"
)]
pub struct NotificationFeedResponse {
    pub notifications: Vec<NotificationResponse>,
    #[ts(type = "number")]
    pub unread_count: u64,
}

impl From<NotificationFeed> for NotificationFeedResponse {
    fn from(feed: NotificationFeed) -> Self {
        Self {
            notifications: feed
                .notifications
                .into_iter()
                .map(NotificationResponse::from)
                .collect(),
            unread_count: feed.unread_count,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/mark-all-read-response.ts"
)]
pub struct MarkAllReadResponse {
    #[ts(type = "number")]
    pub updated: u64,
}
