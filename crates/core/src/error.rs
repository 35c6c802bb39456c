//! Error taxonomy for the sickbay core.
//!
//! Every operation in this crate returns [`ClinicResult`]. The variants split
//! into caller errors (invalid input, unknown ids, access denials) and storage
//! errors (file system and serialisation failures). The API layer maps caller
//! errors to 4xx responses and storage errors to a generic 5xx so that file
//! system details never leak to clients.

use sickbay_types::TextError;

#[derive(Debug, thiserror::Error)]
pub enum ClinicError {
    /// A required field was missing, empty, or outside its allowed values.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The requested record does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// No valid caller identity could be established (missing, malformed, or
    /// expired credential). Distinct from [`ClinicError::Unauthorized`] so the
    /// two show up separately in audit logs.
    #[error("not authorised, no valid credential")]
    AuthenticationMissing,

    /// The caller is authenticated but their role does not permit the action.
    #[error("not authorised as {required}")]
    Unauthorized {
        /// Human-readable description of the roles that may perform the action.
        required: &'static str,
    },

    /// A write referenced a student record that does not exist.
    #[error("referenced student does not exist: {0}")]
    InvalidReference(String),

    /// A student with the same admission number already exists.
    #[error("student with admission number '{0}' already exists")]
    DuplicateAdmissionNo(String),

    /// A staff account with the same email already exists.
    #[error("staff account with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to create record directory: {0}")]
    RecordDirCreation(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialise record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialise record: {0}")]
    Deserialization(serde_json::Error),
}

impl From<TextError> for ClinicError {
    fn from(err: TextError) -> Self {
        ClinicError::InvalidInput(err.to_string())
    }
}

pub type ClinicResult<T> = std::result::Result<T, ClinicError>;
