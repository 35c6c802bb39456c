//! Staff account registry.
//!
//! Owns the accounts behind every caller identity: admins, doctors, and
//! nurses. Passwords are stored as salted SHA-256 digests; the hashing scheme
//! is an internal detail of this module and deliberately easy to swap.
//!
//! The visit engine consumes this module only through the [`StaffNames`]
//! trait, for display-time resolution of `attendedBy`/`reviewedBy` ids.

use crate::caller::{Caller, Role};
use crate::config::CoreConfig;
use crate::constants::STAFF_JSON_FILENAME;
use crate::error::{ClinicError, ClinicResult};
use crate::policy::{authorise, Action};
use crate::store;
use crate::uuid::RecordUuid;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sickbay_types::{EmailAddress, NonEmptyText};
use std::sync::Arc;

/// A staff account as stored on disk. Never leaves the core; the API layer
/// only ever sees [`StaffProfile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffAccount {
    pub id: RecordUuid,
    pub full_name: String,
    pub email: EmailAddress,
    pub role: Role,
    password_salt: String,
    password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StaffAccount {
    /// Returns the projection safe to show to clients.
    pub fn profile(&self) -> StaffProfile {
        StaffProfile {
            id: self.id.clone(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }

    /// Returns the caller identity for this account.
    pub fn caller(&self) -> Caller {
        Caller {
            id: self.id.clone(),
            role: self.role,
            full_name: self.full_name.clone(),
        }
    }
}

/// Display projection of a staff account (no credential material).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffProfile {
    pub id: RecordUuid,
    pub full_name: String,
    pub email: EmailAddress,
    pub role: Role,
}

/// Input for creating a staff account.
#[derive(Debug, Clone)]
pub struct NewStaff {
    pub full_name: NonEmptyText,
    pub email: EmailAddress,
    pub password: NonEmptyText,
    pub role: Role,
}

/// Display-name resolution capability consumed by the visit engine.
pub trait StaffNames: Send + Sync {
    /// Returns the full name for a staff id, or `None` if it does not resolve.
    fn full_name(&self, id: &RecordUuid) -> ClinicResult<Option<String>>;
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Service owning staff accounts.
#[derive(Clone)]
pub struct StaffService {
    cfg: Arc<CoreConfig>,
}

impl StaffService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Creates a staff account without an access-policy check.
    ///
    /// This is the bootstrap path: the CLI uses it to seed the first admin
    /// account when no caller identity can exist yet. API-facing registration
    /// goes through [`StaffService::register`], which gates on the admin role
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::DuplicateEmail`] if an account with this email
    /// already exists.
    pub fn create_account(&self, new: NewStaff) -> ClinicResult<StaffProfile> {
        let existing: Vec<StaffAccount> = store::read_all(&self.cfg.staff_dir(), STAFF_JSON_FILENAME);
        if existing.iter().any(|a| a.email == new.email) {
            return Err(ClinicError::DuplicateEmail(new.email.to_string()));
        }

        let (id, dir) = store::create_record_dir(&self.cfg.staff_dir(), RecordUuid::new)?;
        let now = Utc::now();
        let salt = generate_salt();
        let hash = hash_password(&salt, new.password.as_str());

        let account = StaffAccount {
            id,
            full_name: new.full_name.into_inner(),
            email: new.email,
            role: new.role,
            password_salt: salt,
            password_hash: hash,
            created_at: now,
            updated_at: now,
        };

        store::write_json_atomic(&dir.join(STAFF_JSON_FILENAME), &account)?;
        tracing::info!(staff = %account.id, role = %account.role, "staff account created");

        Ok(account.profile())
    }

    /// Registers a staff account on behalf of an admin.
    pub fn register(&self, caller: &Caller, new: NewStaff) -> ClinicResult<StaffProfile> {
        authorise(caller, Action::RegisterStaff)?;
        self.create_account(new)
    }

    /// Lists all staff profiles. Admin only.
    pub fn list(&self, caller: &Caller) -> ClinicResult<Vec<StaffProfile>> {
        authorise(caller, Action::ListStaff)?;

        let mut profiles: Vec<StaffProfile> =
            store::read_all::<StaffAccount>(&self.cfg.staff_dir(), STAFF_JSON_FILENAME)
                .iter()
                .map(StaffAccount::profile)
                .collect();
        profiles.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(profiles)
    }

    /// Looks up an account by id.
    pub fn find(&self, id: &RecordUuid) -> ClinicResult<Option<StaffAccount>> {
        let path = store::document_path(&self.cfg.staff_dir(), id, STAFF_JSON_FILENAME);
        if !path.is_file() {
            return Ok(None);
        }
        store::read_json(&path).map(Some)
    }

    /// Verifies an email/password pair, returning the matching account.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::AuthenticationMissing`] for an unknown email or
    /// a wrong password. The two cases are indistinguishable to the caller.
    pub fn authenticate(&self, email: &EmailAddress, password: &str) -> ClinicResult<StaffAccount> {
        let accounts: Vec<StaffAccount> = store::read_all(&self.cfg.staff_dir(), STAFF_JSON_FILENAME);
        let account = accounts.into_iter().find(|a| &a.email == email);

        match account {
            Some(account)
                if hash_password(&account.password_salt, password) == account.password_hash =>
            {
                Ok(account)
            }
            _ => {
                tracing::debug!(email = %email, "login failed: unknown email or wrong password");
                Err(ClinicError::AuthenticationMissing)
            }
        }
    }

    /// Number of accounts holding a given role. Used by the dashboard.
    pub(crate) fn count_role(&self, role: Role) -> usize {
        store::read_all::<StaffAccount>(&self.cfg.staff_dir(), STAFF_JSON_FILENAME)
            .iter()
            .filter(|a| a.role == role)
            .count()
    }
}

impl StaffNames for StaffService {
    fn full_name(&self, id: &RecordUuid) -> ClinicResult<Option<String>> {
        Ok(self.find(id)?.map(|a| a.full_name))
    }
}
