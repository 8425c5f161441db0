use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AppError, UserId};

/// Role assigned to a user by the authentication collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Unrestricted platform administrator.
    #[serde(rename = "Super Admin")]
    SuperAdmin,
    /// College administrator granting final publication.
    #[serde(rename = "College Admin")]
    CollegeAdmin,
    /// Faculty member reviewing submitted events.
    #[serde(rename = "Faculty Mentor")]
    FacultyMentor,
    /// Student organizer drafting events.
    #[serde(rename = "Event Organizer")]
    EventOrganizer,
    /// Student attending events.
    #[serde(rename = "Student")]
    Student,
}

impl Role {
    /// Returns the transport label for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "Super Admin",
            Self::CollegeAdmin => "College Admin",
            Self::FacultyMentor => "Faculty Mentor",
            Self::EventOrganizer => "Event Organizer",
            Self::Student => "Student",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[
            Role::SuperAdmin,
            Role::CollegeAdmin,
            Role::FacultyMentor,
            Role::EventOrganizer,
            Role::Student,
        ];

        ALL
    }
}

impl Display for Role {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| AppError::Validation(format!("unknown role '{value}'")))
    }
}

/// Already-verified caller attached to every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    user_id: UserId,
    display_name: String,
    role: Role,
}

impl Actor {
    /// Creates an actor from identity data supplied by the authentication collaborator.
    #[must_use]
    pub fn new(user_id: UserId, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
            role,
        }
    }

    /// Returns the stable user identifier.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the role of the current user.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }
}
