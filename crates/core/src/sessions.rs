//! Identity collaborator: login and caller resolution.
//!
//! Login verifies a password against the staff registry and mints an opaque
//! bearer token with a 30-day expiry, stored as a small flat document under
//! `sessions/<token>.json`. Every API request resolves its token back to a
//! [`Caller`] through [`SessionService::resolve_caller`].
//!
//! Any failure to establish an identity — malformed token, unknown token,
//! expired session, vanished account — is
//! [`ClinicError::AuthenticationMissing`]. Role checks happen later, in the
//! policy evaluator.

use crate::caller::Caller;
use crate::config::CoreConfig;
use crate::constants::SESSION_TTL_DAYS;
use crate::error::{ClinicError, ClinicResult};
use crate::staff::{StaffProfile, StaffService};
use crate::store;
use crate::uuid::RecordUuid;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sickbay_types::EmailAddress;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// A stored login session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    token: String,
    staff_id: RecordUuid,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginSession {
    /// Opaque bearer token to present on subsequent requests.
    pub token: String,
    /// Profile of the authenticated staff member.
    pub staff: StaffProfile,
}

/// Returns true if `token` has the syntax of a minted token (64 lowercase hex
/// characters). Checked before the token is used in a path.
fn is_valid_token_syntax(token: &str) -> bool {
    token.len() == 64
        && token
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Service owning login sessions and caller resolution.
#[derive(Clone)]
pub struct SessionService {
    cfg: Arc<CoreConfig>,
    staff: StaffService,
}

impl SessionService {
    pub fn new(cfg: Arc<CoreConfig>, staff: StaffService) -> Self {
        Self { cfg, staff }
    }

    fn session_path(&self, token: &str) -> PathBuf {
        self.cfg.sessions_dir().join(format!("{token}.json"))
    }

    /// Verifies the credentials and mints a new session token.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::AuthenticationMissing`] for an unknown email or
    /// wrong password.
    pub fn login(&self, email: &EmailAddress, password: &str) -> ClinicResult<LoginSession> {
        let account = self.staff.authenticate(email, password)?;

        let sessions_dir = self.cfg.sessions_dir();
        fs::create_dir_all(&sessions_dir).map_err(ClinicError::StorageDirCreation)?;

        let now = Utc::now();
        let session = Session {
            token: generate_token(),
            staff_id: account.id.clone(),
            issued_at: now,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
        };

        store::write_json_atomic(&self.session_path(&session.token), &session)?;
        tracing::info!(staff = %account.id, role = %account.role, "session issued");

        Ok(LoginSession {
            token: session.token,
            staff: account.profile(),
        })
    }

    /// Resolves a bearer token to a caller identity.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::AuthenticationMissing`] if the token is
    /// malformed, unknown, expired, or refers to an account that no longer
    /// exists. Failures are logged at `debug`; they are routine (expired
    /// browser sessions), not suspicious.
    pub fn resolve_caller(&self, token: &str) -> ClinicResult<Caller> {
        if !is_valid_token_syntax(token) {
            tracing::debug!("rejected credential with invalid token syntax");
            return Err(ClinicError::AuthenticationMissing);
        }

        let path = self.session_path(token);
        if !path.is_file() {
            tracing::debug!("rejected unknown session token");
            return Err(ClinicError::AuthenticationMissing);
        }

        let session: Session = store::read_json(&path)?;
        if session.expires_at <= Utc::now() {
            tracing::debug!(staff = %session.staff_id, "rejected expired session");
            return Err(ClinicError::AuthenticationMissing);
        }

        match self.staff.find(&session.staff_id)? {
            Some(account) => Ok(account.caller()),
            None => {
                tracing::debug!(staff = %session.staff_id, "session refers to deleted account");
                Err(ClinicError::AuthenticationMissing)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caller::Role;
    use crate::staff::NewStaff;
    use sickbay_types::NonEmptyText;
    use std::path::Path;
    use tempfile::TempDir;

    fn test_cfg(data_dir: &Path) -> Arc<CoreConfig> {
        Arc::new(CoreConfig::new(data_dir.to_path_buf()).expect("CoreConfig::new should succeed"))
    }

    fn seed_nurse(staff: &StaffService) -> StaffProfile {
        staff
            .create_account(NewStaff {
                full_name: NonEmptyText::new("Nurse Joy").unwrap(),
                email: EmailAddress::parse("nurse@school.ng").unwrap(),
                password: NonEmptyText::new("secret").unwrap(),
                role: Role::Nurse,
            })
            .expect("seeding nurse should succeed")
    }

    #[test]
    fn login_then_resolve_round_trips() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(temp_dir.path());
        let staff = StaffService::new(cfg.clone());
        let sessions = SessionService::new(cfg, staff.clone());
        let profile = seed_nurse(&staff);

        let login = sessions
            .login(&EmailAddress::parse("nurse@school.ng").unwrap(), "secret")
            .expect("login should succeed");
        assert_eq!(login.token.len(), 64);

        let caller = sessions
            .resolve_caller(&login.token)
            .expect("token should resolve");
        assert_eq!(caller.id, profile.id);
        assert_eq!(caller.role, Role::Nurse);
        assert_eq!(caller.full_name, "Nurse Joy");
    }

    #[test]
    fn login_rejects_wrong_password() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(temp_dir.path());
        let staff = StaffService::new(cfg.clone());
        let sessions = SessionService::new(cfg, staff.clone());
        seed_nurse(&staff);

        let err = sessions
            .login(&EmailAddress::parse("nurse@school.ng").unwrap(), "nope")
            .expect_err("wrong password should fail");
        assert!(matches!(err, ClinicError::AuthenticationMissing));
    }

    #[test]
    fn resolve_rejects_malformed_tokens_before_path_use() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(temp_dir.path());
        let staff = StaffService::new(cfg.clone());
        let sessions = SessionService::new(cfg, staff);

        for token in ["", "short", "../../etc/passwd", &"Z".repeat(64)] {
            let err = sessions
                .resolve_caller(token)
                .expect_err("malformed token should be rejected");
            assert!(matches!(err, ClinicError::AuthenticationMissing));
        }
    }

    #[test]
    fn resolve_rejects_unknown_token() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(temp_dir.path());
        let staff = StaffService::new(cfg.clone());
        let sessions = SessionService::new(cfg, staff);

        let err = sessions
            .resolve_caller(&"a".repeat(64))
            .expect_err("unknown token should be rejected");
        assert!(matches!(err, ClinicError::AuthenticationMissing));
    }

    #[test]
    fn resolve_rejects_expired_session() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(temp_dir.path());
        let staff = StaffService::new(cfg.clone());
        let sessions = SessionService::new(cfg.clone(), staff.clone());
        let profile = seed_nurse(&staff);

        // Write a session document whose expiry is already in the past.
        fs::create_dir_all(cfg.sessions_dir()).unwrap();
        let token = "b".repeat(64);
        let stale = Session {
            token: token.clone(),
            staff_id: profile.id,
            issued_at: Utc::now() - Duration::days(SESSION_TTL_DAYS + 1),
            expires_at: Utc::now() - Duration::days(1),
        };
        store::write_json_atomic(&cfg.sessions_dir().join(format!("{token}.json")), &stale)
            .expect("stale session should write");

        let err = sessions
            .resolve_caller(&token)
            .expect_err("expired session should be rejected");
        assert!(matches!(err, ClinicError::AuthenticationMissing));
    }

    #[test]
    fn resolve_rejects_session_for_deleted_account() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(temp_dir.path());
        let staff = StaffService::new(cfg.clone());
        let sessions = SessionService::new(cfg.clone(), staff.clone());
        seed_nurse(&staff);

        fs::create_dir_all(cfg.sessions_dir()).unwrap();
        let token = "c".repeat(64);
        let orphaned = Session {
            token: token.clone(),
            staff_id: RecordUuid::new(),
            issued_at: Utc::now(),
            expires_at: Utc::now() + Duration::days(1),
        };
        store::write_json_atomic(&cfg.sessions_dir().join(format!("{token}.json")), &orphaned)
            .expect("orphaned session should write");

        let err = sessions
            .resolve_caller(&token)
            .expect_err("session for missing account should be rejected");
        assert!(matches!(err, ClinicError::AuthenticationMissing));
    }
}
