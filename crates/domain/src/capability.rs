//! Role-to-capability table and per-role event visibility.

use schedly_core::{Actor, Role, UserId};
use serde::{Deserialize, Serialize};

use crate::{Event, EventStatus};

/// Operation an actor may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Create draft events.
    CreateEvent,
    /// Edit draft events.
    UpdateEvent,
    /// Submit drafts for review.
    SubmitEvent,
    /// Approve or reject submissions.
    ReviewEvent,
    /// Publish faculty-approved events.
    PublishEvent,
    /// Mark published events completed.
    CompleteEvent,
    /// Archive events.
    ArchiveEvent,
    /// Delete events.
    DeleteEvent,
    /// Register for published events.
    RegisterForEvent,
    /// Cancel a registration.
    CancelRegistration,
    /// List one's own registrations.
    ViewOwnRegistrations,
    /// List registrations, mark attendance, issue certificates.
    ManageRegistrations,
    /// Read certificate details.
    ViewCertificate,
}

impl Capability {
    /// Returns the stable value for this capability.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateEvent => "create_event",
            Self::UpdateEvent => "update_event",
            Self::SubmitEvent => "submit_event",
            Self::ReviewEvent => "review_event",
            Self::PublishEvent => "publish_event",
            Self::CompleteEvent => "complete_event",
            Self::ArchiveEvent => "archive_event",
            Self::DeleteEvent => "delete_event",
            Self::RegisterForEvent => "register_for_event",
            Self::CancelRegistration => "cancel_registration",
            Self::ViewOwnRegistrations => "view_own_registrations",
            Self::ManageRegistrations => "manage_registrations",
            Self::ViewCertificate => "view_certificate",
        }
    }
}

/// Which resources a grant covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Every resource.
    Any,
    /// Only resources the actor owns.
    Owned,
}

const GRANTS: &[(Role, Capability, Scope)] = &[
    (Role::EventOrganizer, Capability::CreateEvent, Scope::Any),
    (Role::EventOrganizer, Capability::UpdateEvent, Scope::Owned),
    (Role::EventOrganizer, Capability::SubmitEvent, Scope::Owned),
    (Role::EventOrganizer, Capability::CompleteEvent, Scope::Owned),
    (Role::EventOrganizer, Capability::DeleteEvent, Scope::Owned),
    (Role::EventOrganizer, Capability::ManageRegistrations, Scope::Owned),
    (Role::EventOrganizer, Capability::ViewCertificate, Scope::Any),
    (Role::FacultyMentor, Capability::ReviewEvent, Scope::Any),
    (Role::FacultyMentor, Capability::ViewCertificate, Scope::Any),
    (Role::CollegeAdmin, Capability::PublishEvent, Scope::Any),
    (Role::CollegeAdmin, Capability::CompleteEvent, Scope::Any),
    (Role::CollegeAdmin, Capability::ArchiveEvent, Scope::Any),
    (Role::CollegeAdmin, Capability::ManageRegistrations, Scope::Any),
    (Role::CollegeAdmin, Capability::ViewCertificate, Scope::Any),
    (Role::SuperAdmin, Capability::PublishEvent, Scope::Any),
    (Role::SuperAdmin, Capability::CompleteEvent, Scope::Any),
    (Role::SuperAdmin, Capability::ArchiveEvent, Scope::Any),
    (Role::SuperAdmin, Capability::DeleteEvent, Scope::Any),
    (Role::SuperAdmin, Capability::ManageRegistrations, Scope::Any),
    (Role::SuperAdmin, Capability::ViewCertificate, Scope::Any),
    (Role::Student, Capability::RegisterForEvent, Scope::Any),
    (Role::Student, Capability::CancelRegistration, Scope::Owned),
    (Role::Student, Capability::ViewOwnRegistrations, Scope::Owned),
    (Role::Student, Capability::ViewCertificate, Scope::Owned),
];

/// Looks up the scope `role` holds for `capability`, if any.
#[must_use]
pub fn grant_for(role: Role, capability: Capability) -> Option<Scope> {
    GRANTS
        .iter()
        .find(|(granted_role, granted, _)| *granted_role == role && *granted == capability)
        .map(|(_, _, scope)| *scope)
}

/// Subset of events an actor may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventVisibility {
    /// Every event.
    All,
    /// Events organized by the given user.
    OrganizedBy(UserId),
    /// Events in one of the listed statuses.
    Statuses(&'static [EventStatus]),
}

impl EventVisibility {
    /// Resolves visibility for an actor.
    #[must_use]
    pub fn for_actor(actor: &Actor) -> Self {
        match actor.role() {
            Role::SuperAdmin => Self::All,
            Role::CollegeAdmin => Self::Statuses(&[
                EventStatus::FacultyApproved,
                EventStatus::Published,
                EventStatus::Completed,
            ]),
            Role::FacultyMentor => Self::Statuses(&[
                EventStatus::Submitted,
                EventStatus::FacultyApproved,
                EventStatus::FacultyRejected,
            ]),
            Role::EventOrganizer => Self::OrganizedBy(actor.user_id()),
            Role::Student => Self::Statuses(&[EventStatus::Published]),
        }
    }

    /// Returns whether `event` falls inside this visibility.
    #[must_use]
    pub fn permits(&self, event: &Event) -> bool {
        match self {
            Self::All => true,
            Self::OrganizedBy(organizer) => event.organizer() == *organizer,
            Self::Statuses(statuses) => statuses.contains(&event.status()),
        }
    }
}
