//! Constants used throughout the sickbay core crate.
//!
//! This module contains all path and filename constants to ensure
//! consistency across the codebase and make maintenance easier.

/// Default directory for clinic data storage when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "clinic_data";

/// Directory name for clinic visit records.
pub const VISITS_DIR_NAME: &str = "visits";

/// Directory name for student records.
pub const STUDENTS_DIR_NAME: &str = "students";

/// Directory name for staff accounts.
pub const STAFF_DIR_NAME: &str = "staff";

/// Directory name for session documents.
pub const SESSIONS_DIR_NAME: &str = "sessions";

/// Filename for visit JSON documents.
pub const VISIT_JSON_FILENAME: &str = "visit.json";

/// Filename for student JSON documents.
pub const STUDENT_JSON_FILENAME: &str = "student.json";

/// Filename for staff JSON documents.
pub const STAFF_JSON_FILENAME: &str = "account.json";

/// Lifetime of a login session, in days.
pub const SESSION_TTL_DAYS: i64 = 30;
