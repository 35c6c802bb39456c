//! Record identifiers and sharded-path derivation.
//!
//! Sickbay stores every document under a sharded directory derived from its
//! identifier. To keep path derivation deterministic across the codebase, a
//! *canonical* representation is used for storage identifiers: **32 lowercase
//! hexadecimal characters** (no hyphens) — the same value produced by
//! `Uuid::new_v4().simple().to_string()`.
//!
//! ## Sharded directory layout
//! For a canonical identifier `u`, data lives under
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`, e.g.
//! `clinic_data/visits/55/0e/550e8400e29b41d4a716446655440000/`.
//!
//! Sharding bounds per-directory fan-out so listings stay fast even with many
//! years of visit records.

use crate::error::{ClinicError, ClinicResult};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Sickbay's canonical record identifier (32 lowercase hex characters, no hyphens).
///
/// Once constructed, the contained UUID is guaranteed to be in canonical form,
/// so path derivation and display are consistent everywhere.
///
/// # Construction
/// - [`RecordUuid::new`] generates a fresh identifier for a new record.
/// - [`RecordUuid::parse`] validates an externally supplied identifier
///   (CLI input, API path segment). Non-canonical values (uppercase,
///   hyphenated, wrong length, non-hex) are rejected.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordUuid(Uuid);

impl RecordUuid {
    /// Generates a new identifier in canonical form.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier that must already be canonical.
    ///
    /// This does **not** normalise other common UUID forms; callers must
    /// provide the canonical representation.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidInput`] if `input` is not canonical.
    pub fn parse(input: &str) -> ClinicResult<Self> {
        if Self::is_canonical(input) {
            // SAFETY: is_canonical guarantees valid hex, so parse_str will succeed
            let uuid = Uuid::parse_str(input).expect("is_canonical guarantees valid UUID");
            return Ok(Self(uuid));
        }
        Err(ClinicError::InvalidInput(format!(
            "record id must be 32 lowercase hex characters without hyphens, got: '{}'",
            input
        )))
    }

    /// Returns true if `input` is in canonical form.
    ///
    /// Purely syntactic: exactly 32 bytes, lowercase hex only.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns `parent_dir/<s1>/<s2>/<uuid>/` where `s1`/`s2` are the first
    /// four hex characters of this identifier.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        let s1 = &canonical[0..2];
        let s2 = &canonical[2..4];
        parent_dir.join(s1).join(s2).join(&canonical)
    }
}

impl Default for RecordUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Display in canonical (simple) form
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for RecordUuid {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordUuid::parse(s)
    }
}

impl serde::Serialize for RecordUuid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.simple().to_string())
    }
}

impl<'de> serde::Deserialize<'de> for RecordUuid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordUuid::parse(&s).map_err(serde::de::Error::custom)
    }
}
