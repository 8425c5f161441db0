//! Lifecycle actions, review decisions and the event status transition table.

use std::str::FromStr;

use schedly_core::{AppError, Role};
use serde::{Deserialize, Serialize};

use crate::{AuditAction, EventStatus};

/// Operation that may move an event between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    /// Create a new draft.
    Create,
    /// Edit a draft in place.
    Update,
    /// Submit a draft for faculty review.
    Submit,
    /// Faculty approves a submission.
    FacultyApprove,
    /// Faculty rejects a submission.
    FacultyReject,
    /// Administrator publishes a faculty-approved event.
    AdminApprove,
    /// Mark a published event completed.
    Complete,
    /// Retire an event.
    Archive,
    /// Remove an event.
    Delete,
}

impl LifecycleAction {
    /// Returns the stable value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Submit => "submit",
            Self::FacultyApprove => "faculty_approve",
            Self::FacultyReject => "faculty_reject",
            Self::AdminApprove => "admin_approve",
            Self::Complete => "complete",
            Self::Archive => "archive",
            Self::Delete => "delete",
        }
    }

    /// Returns the verb used in user-facing error messages.
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Submit => "submit",
            Self::FacultyApprove | Self::AdminApprove => "approve",
            Self::FacultyReject => "reject",
            Self::Complete => "complete",
            Self::Archive => "archive",
            Self::Delete => "delete",
        }
    }

    /// Returns the audit tag recorded for this action. Deletion has none.
    #[must_use]
    pub fn audit_action(&self) -> Option<AuditAction> {
        match self {
            Self::Create => Some(AuditAction::Create),
            Self::Update => Some(AuditAction::Update),
            Self::Submit => Some(AuditAction::Submit),
            Self::FacultyApprove | Self::AdminApprove => Some(AuditAction::Approve),
            Self::FacultyReject => Some(AuditAction::Reject),
            Self::Complete => Some(AuditAction::Complete),
            Self::Archive => Some(AuditAction::Archive),
            Self::Delete => None,
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[LifecycleAction] = &[
            LifecycleAction::Create,
            LifecycleAction::Update,
            LifecycleAction::Submit,
            LifecycleAction::FacultyApprove,
            LifecycleAction::FacultyReject,
            LifecycleAction::AdminApprove,
            LifecycleAction::Complete,
            LifecycleAction::Archive,
            LifecycleAction::Delete,
        ];

        ALL
    }
}

/// Faculty review decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    /// Accept the submission.
    Approve,
    /// Reject the submission.
    Reject,
}

impl ReviewDecision {
    /// Returns the lifecycle action this decision triggers.
    #[must_use]
    pub fn action(&self) -> LifecycleAction {
        match self {
            Self::Approve => LifecycleAction::FacultyApprove,
            Self::Reject => LifecycleAction::FacultyReject,
        }
    }
}

impl FromStr for ReviewDecision {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            other => Err(AppError::Validation(format!(
                "decision must be 'approve' or 'reject', got '{other}'"
            ))),
        }
    }
}

/// Transition table. `None` as the source status means the event does not exist yet.
///
/// Returns `None` when the action is not allowed from the given status.
/// Deletion is not a status change and is governed by [`deletion_allowed`].
#[must_use]
pub fn next_status(from: Option<EventStatus>, action: LifecycleAction) -> Option<EventStatus> {
    use EventStatus as S;
    use LifecycleAction as A;

    match (from, action) {
        (None, A::Create) => Some(S::Draft),
        (Some(S::Draft), A::Update) => Some(S::Draft),
        (Some(S::Draft), A::Submit) => Some(S::Submitted),
        (Some(S::Submitted), A::FacultyApprove) => Some(S::FacultyApproved),
        (Some(S::Submitted), A::FacultyReject) => Some(S::FacultyRejected),
        (Some(S::FacultyApproved), A::AdminApprove) => Some(S::Published),
        (Some(S::Published), A::Complete) => Some(S::Completed),
        (Some(status), A::Archive) if status != S::Archived => Some(S::Archived),
        _ => None,
    }
}

/// Returns whether an event in `status` may be deleted by `role`.
#[must_use]
pub fn deletion_allowed(status: EventStatus, role: Role) -> bool {
    status == EventStatus::Draft || role == Role::SuperAdmin
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use proptest::sample::select;
    use schedly_core::Role;

    use super::{LifecycleAction, ReviewDecision, deletion_allowed, next_status};
    use crate::EventStatus;

    fn any_status() -> impl Strategy<Value = EventStatus> {
        select(EventStatus::all().to_vec())
    }

    fn any_action() -> impl Strategy<Value = LifecycleAction> {
        select(LifecycleAction::all().to_vec())
    }

    #[test]
    fn happy_path_reaches_completed() {
        let mut status = next_status(None, LifecycleAction::Create);
        for action in [
            LifecycleAction::Submit,
            LifecycleAction::FacultyApprove,
            LifecycleAction::AdminApprove,
            LifecycleAction::Complete,
        ] {
            status = status.and_then(|current| next_status(Some(current), action));
        }
        assert_eq!(status, Some(EventStatus::Completed));
    }

    #[test]
    fn rejected_events_only_archive() {
        for action in LifecycleAction::all() {
            let next = next_status(Some(EventStatus::FacultyRejected), *action);
            if *action == LifecycleAction::Archive {
                assert_eq!(next, Some(EventStatus::Archived));
            } else {
                assert_eq!(next, None);
            }
        }
    }

    #[test]
    fn archive_is_not_repeatable() {
        assert_eq!(
            next_status(Some(EventStatus::Archived), LifecycleAction::Archive),
            None
        );
    }

    #[test]
    fn review_decision_parses_lowercase_tokens() {
        assert_eq!(
            "approve".parse::<ReviewDecision>().ok(),
            Some(ReviewDecision::Approve)
        );
        assert!("maybe".parse::<ReviewDecision>().is_err());
    }

    #[test]
    fn only_super_admin_deletes_beyond_draft() {
        assert!(deletion_allowed(EventStatus::Draft, Role::EventOrganizer));
        assert!(!deletion_allowed(
            EventStatus::Published,
            Role::EventOrganizer
        ));
        assert!(deletion_allowed(EventStatus::Published, Role::SuperAdmin));
    }

    proptest! {
        #[test]
        fn create_only_applies_to_missing_events(action in any_action()) {
            let created = next_status(None, action);
            prop_assert_eq!(created.is_some(), action == LifecycleAction::Create);
        }

        #[test]
        fn existing_events_never_recreate(status in any_status()) {
            prop_assert_eq!(next_status(Some(status), LifecycleAction::Create), None);
            prop_assert_eq!(next_status(Some(status), LifecycleAction::Delete), None);
        }

        #[test]
        fn archived_is_absorbing(action in any_action()) {
            prop_assert_eq!(next_status(Some(EventStatus::Archived), action), None);
        }

        #[test]
        fn only_archive_leaves_terminal_statuses(status in any_status(), action in any_action()) {
            if status.is_terminal() {
                if let Some(next) = next_status(Some(status), action) {
                    prop_assert_eq!(action, LifecycleAction::Archive);
                    prop_assert_eq!(next, EventStatus::Archived);
                }
            }
        }

        #[test]
        fn only_updates_keep_status(status in any_status(), action in any_action()) {
            if next_status(Some(status), action) == Some(status) {
                prop_assert_eq!(action, LifecycleAction::Update);
                prop_assert_eq!(status, EventStatus::Draft);
            }
        }

        #[test]
        fn publication_requires_faculty_approval(status in any_status(), action in any_action()) {
            if next_status(Some(status), action) == Some(EventStatus::Published) {
                prop_assert_eq!(status, EventStatus::FacultyApproved);
                prop_assert_eq!(action, LifecycleAction::AdminApprove);
            }
        }

        #[test]
        fn any_non_archived_status_can_archive(status in any_status()) {
            let archived = next_status(Some(status), LifecycleAction::Archive);
            prop_assert_eq!(archived.is_some(), status != EventStatus::Archived);
        }
    }
}
