//! Participant model and role-based entry flow selection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a participant.
///
/// Students and coaches are the two operationally distinct session roles;
/// admins manage data but never participate in sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Initiator role: automatically paired with a single assigned coach.
    Student,
    /// Responder role: explicitly selects a student from assignments.
    Coach,
    /// Administrative role, never part of a session.
    Admin,
}

impl Role {
    /// Convert role to string for database storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Coach => "coach",
            Self::Admin => "admin",
        }
    }

    /// Parse role from database string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "student" => Some(Self::Student),
            "coach" => Some(Self::Coach),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which UI flow a participant enters after sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryFlow {
    /// Straight to the main surface; the assignment supplies the partner.
    Direct,
    /// A partner must be explicitly selected before the main surface.
    PartnerSelection,
}

impl EntryFlow {
    /// Select the entry flow for a role.
    ///
    /// Unknown or absent roles fall open to direct access; only a coach is
    /// gated behind partner selection.
    pub const fn for_role(role: Option<Role>) -> Self {
        match role {
            Some(Role::Coach) => Self::PartnerSelection,
            Some(Role::Student | Role::Admin) | None => Self::Direct,
        }
    }
}

impl std::fmt::Display for EntryFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Direct => "direct",
            Self::PartnerSelection => "partner_selection",
        };
        write!(f, "{s}")
    }
}

/// A participant profile as stored in the backing store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Opaque stable identifier.
    pub id: String,
    /// Display name shown in partner lists.
    pub display_name: String,
    /// Role attribute driving the entry flow.
    pub role: Role,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
}

impl Participant {
    /// Create a new participant.
    pub fn new(id: String, display_name: String, role: Role) -> Self {
        Self {
            id,
            display_name,
            role,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_flow_for_roles() {
        assert_eq!(EntryFlow::for_role(Some(Role::Student)), EntryFlow::Direct);
        assert_eq!(
            EntryFlow::for_role(Some(Role::Coach)),
            EntryFlow::PartnerSelection
        );
        assert_eq!(EntryFlow::for_role(Some(Role::Admin)), EntryFlow::Direct);
    }

    #[test]
    fn test_entry_flow_fails_open_without_role() {
        assert_eq!(EntryFlow::for_role(None), EntryFlow::Direct);
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Student, Role::Coach, Role::Admin] {
            assert_eq!(Role::from_str(role.as_str()), Some(role));
        }
        assert_eq!(Role::from_str("superuser"), None);
    }
}
