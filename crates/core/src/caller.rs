//! Caller identity.
//!
//! Every core operation takes an explicit [`Caller`] rather than reading
//! ambient request state. The identity collaborator
//! ([`crate::sessions::SessionService`]) is the only place a `Caller` is
//! minted from a credential.

use crate::uuid::RecordUuid;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Staff roles recognised by the access policy.
///
/// The set is closed; the wire representation matches the upper-case strings
/// stored in staff documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Doctor,
    Nurse,
}

impl Role {
    /// All roles, in a fixed order. Used by the policy evaluator for
    /// "any authenticated caller" rules.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Doctor, Role::Nurse];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Doctor => "DOCTOR",
            Role::Nurse => "NURSE",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = crate::ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "DOCTOR" => Ok(Role::Doctor),
            "NURSE" => Ok(Role::Nurse),
            other => Err(crate::ClinicError::InvalidInput(format!(
                "unknown role: '{other}'"
            ))),
        }
    }
}

/// The resolved identity of whoever is invoking an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Staff account identifier.
    pub id: RecordUuid,
    /// Role used by the access policy evaluator.
    pub role: Role,
    /// Display name, carried for audit logging.
    pub full_name: String,
}
