use std::str::FromStr;

use chrono::{DateTime, Utc};
use schedly_core::{AppError, UserId};
use serde::{Deserialize, Serialize};

use crate::{EventId, EventStatus};

/// Action tag stored on audit entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Event created.
    Create,
    /// Draft edited.
    Update,
    /// Draft submitted.
    Submit,
    /// Faculty or admin approval.
    Approve,
    /// Faculty rejection.
    Reject,
    /// Event completed.
    Complete,
    /// Event archived.
    Archive,
}

impl AuditAction {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Complete => "complete",
            Self::Archive => "archive",
        }
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "submit" => Ok(Self::Submit),
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "complete" => Ok(Self::Complete),
            "archive" => Ok(Self::Archive),
            _ => Err(AppError::Validation(format!(
                "unknown audit action '{value}'"
            ))),
        }
    }
}

/// Audit entry not yet assigned a sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    /// Event the entry belongs to.
    pub event_id: EventId,
    /// Acting user.
    pub actor: UserId,
    /// Action tag.
    pub action: AuditAction,
    /// Status before the action. `None` for creation.
    pub from_status: Option<EventStatus>,
    /// Status after the action.
    pub to_status: EventStatus,
    /// Remarks captured with the action.
    pub remarks: String,
    /// Time the action was applied.
    pub recorded_at: DateTime<Utc>,
}

impl NewAuditEntry {
    /// Assigns the store sequence number.
    #[must_use]
    pub fn into_entry(self, sequence: i64) -> AuditLogEntry {
        AuditLogEntry {
            sequence,
            event_id: self.event_id,
            actor: self.actor,
            action: self.action,
            from_status: self.from_status,
            to_status: self.to_status,
            remarks: self.remarks,
            recorded_at: self.recorded_at,
        }
    }
}

/// Append-only record of one applied lifecycle change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Monotonic store-wide sequence; trails are ordered by it, newest first.
    pub sequence: i64,
    /// Event the entry belongs to.
    pub event_id: EventId,
    /// Acting user.
    pub actor: UserId,
    /// Action tag.
    pub action: AuditAction,
    /// Status before the action. `None` for creation.
    pub from_status: Option<EventStatus>,
    /// Status after the action.
    pub to_status: EventStatus,
    /// Remarks captured with the action.
    pub remarks: String,
    /// Time the action was applied.
    pub recorded_at: DateTime<Utc>,
}
