use std::str::FromStr;

use chrono::{DateTime, Utc};
use schedly_core::{AppError, UserId};
use serde::{Deserialize, Serialize};

use crate::{EventId, NotificationId};

/// Category of an in-app notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationType {
    /// Event approved.
    Approval,
    /// Event rejected.
    Rejection,
    /// Event published.
    Publication,
    /// Upcoming event reminder.
    Reminder,
    /// Certificate issued.
    Certificate,
    /// Generic system message.
    System,
}

impl NotificationType {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approval => "Approval",
            Self::Rejection => "Rejection",
            Self::Publication => "Publication",
            Self::Reminder => "Reminder",
            Self::Certificate => "Certificate",
            Self::System => "System",
        }
    }
}

impl FromStr for NotificationType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        [
            Self::Approval,
            Self::Rejection,
            Self::Publication,
            Self::Reminder,
            Self::Certificate,
            Self::System,
        ]
        .into_iter()
        .find(|kind| kind.as_str() == value)
        .ok_or_else(|| AppError::Validation(format!("unknown notification type '{value}'")))
    }
}

/// Stored notification addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification identifier.
    pub id: NotificationId,
    /// Recipient user.
    pub recipient: UserId,
    /// Notification category.
    pub notification_type: NotificationType,
    /// Short title.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Related event, if any.
    pub event_id: Option<EventId>,
    /// Read flag.
    pub is_read: bool,
    /// In-app link.
    pub link: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Notification request produced by a lifecycle or registration change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    /// Recipient user.
    pub recipient: UserId,
    /// Notification category.
    pub notification_type: NotificationType,
    /// Short title.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Related event, if any.
    pub event_id: Option<EventId>,
    /// In-app link.
    pub link: Option<String>,
}

impl NewNotification {
    /// Organizer notice after faculty approval.
    #[must_use]
    pub fn faculty_approved(recipient: UserId, event_id: EventId, title: &str) -> Self {
        Self {
            recipient,
            notification_type: NotificationType::Approval,
            title: "Event Approved by Faculty".to_owned(),
            message: format!(
                "Your event \"{title}\" has been approved by faculty and is pending admin approval."
            ),
            event_id: Some(event_id),
            link: None,
        }
    }

    /// Organizer notice after faculty rejection. Remarks are quoted when present.
    #[must_use]
    pub fn faculty_rejected(
        recipient: UserId,
        event_id: EventId,
        title: &str,
        remarks: &str,
    ) -> Self {
        let message = if remarks.is_empty() {
            format!("Your event \"{title}\" has been rejected by faculty.")
        } else {
            format!("Your event \"{title}\" has been rejected by faculty. Remarks: {remarks}")
        };

        Self {
            recipient,
            notification_type: NotificationType::Rejection,
            title: "Event Rejected by Faculty".to_owned(),
            message,
            event_id: Some(event_id),
            link: None,
        }
    }

    /// Organizer notice after publication.
    #[must_use]
    pub fn published(recipient: UserId, event_id: EventId, title: &str) -> Self {
        Self {
            recipient,
            notification_type: NotificationType::Publication,
            title: "Event Published".to_owned(),
            message: format!("Your event \"{title}\" has been approved and published!"),
            event_id: Some(event_id),
            link: None,
        }
    }

    /// Student notice after a successful registration.
    #[must_use]
    pub fn registered(recipient: UserId, event_id: EventId, title: &str) -> Self {
        Self {
            recipient,
            notification_type: NotificationType::System,
            title: "Registration Confirmed".to_owned(),
            message: format!("You have successfully registered for \"{title}\"."),
            event_id: Some(event_id),
            link: Some(format!("/events/{event_id}")),
        }
    }

    /// Student notice after certificate issuance.
    #[must_use]
    pub fn certificate_issued(recipient: UserId, event_id: EventId, title: &str) -> Self {
        Self {
            recipient,
            notification_type: NotificationType::Certificate,
            title: "Certificate Issued".to_owned(),
            message: format!("Your certificate for \"{title}\" is now available."),
            event_id: Some(event_id),
            link: Some("/my-registrations".to_owned()),
        }
    }
}
