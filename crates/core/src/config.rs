//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::constants::{
    DEFAULT_DATA_DIR, SESSIONS_DIR_NAME, STAFF_DIR_NAME, STUDENTS_DIR_NAME, VISITS_DIR_NAME,
};
use crate::{ClinicError, ClinicResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig` rooted at `data_dir`.
    ///
    /// The collection subdirectories (`visits/`, `students/`, `staff/`,
    /// `sessions/`) are created lazily by the services, so `data_dir` only
    /// needs to exist, not to be pre-populated.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidInput`] if `data_dir` is empty.
    pub fn new(data_dir: PathBuf) -> ClinicResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(ClinicError::InvalidInput(
                "data directory cannot be empty".into(),
            ));
        }

        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn visits_dir(&self) -> PathBuf {
        self.data_dir.join(VISITS_DIR_NAME)
    }

    pub fn students_dir(&self) -> PathBuf {
        self.data_dir.join(STUDENTS_DIR_NAME)
    }

    pub fn staff_dir(&self) -> PathBuf {
        self.data_dir.join(STAFF_DIR_NAME)
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join(SESSIONS_DIR_NAME)
    }
}

/// Resolve the data directory from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, the default directory is used.
/// Environment reading itself stays in the binaries; this helper keeps the
/// parsing logic testable.
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_derives_collection_dirs() {
        let cfg = CoreConfig::new(PathBuf::from("/srv/clinic")).expect("config should build");

        assert_eq!(cfg.visits_dir(), PathBuf::from("/srv/clinic/visits"));
        assert_eq!(cfg.students_dir(), PathBuf::from("/srv/clinic/students"));
        assert_eq!(cfg.staff_dir(), PathBuf::from("/srv/clinic/staff"));
        assert_eq!(cfg.sessions_dir(), PathBuf::from("/srv/clinic/sessions"));
    }

    #[test]
    fn config_rejects_empty_data_dir() {
        let err = CoreConfig::new(PathBuf::new()).expect_err("empty path should be rejected");
        assert!(matches!(err, ClinicError::InvalidInput(_)));
    }

    #[test]
    fn data_dir_from_env_value_falls_back_to_default() {
        assert_eq!(
            data_dir_from_env_value(None),
            PathBuf::from(DEFAULT_DATA_DIR)
        );
        assert_eq!(
            data_dir_from_env_value(Some("   ".into())),
            PathBuf::from(DEFAULT_DATA_DIR)
        );
        assert_eq!(
            data_dir_from_env_value(Some("/var/clinic".into())),
            PathBuf::from("/var/clinic")
        );
    }
}
