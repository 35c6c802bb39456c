//! # Sickbay Core
//!
//! Core business logic for the school clinic record system.
//!
//! This crate contains pure data operations and file/folder management:
//! - Clinic visit lifecycle (creation, amendment, doctor review, follow-up
//!   reports) with sharded JSON storage
//! - Student directory and staff registry
//! - Role-based access policy and login sessions
//!
//! **No API concerns**: HTTP servers, wire DTOs, and service interfaces
//! belong in `api-rest`.

pub mod caller;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod error;
pub mod policy;
pub mod sessions;
pub mod staff;
mod store;
pub mod students;
pub mod uuid;
pub mod visits;

pub use caller::{Caller, Role};
pub use config::CoreConfig;
pub use error::{ClinicError, ClinicResult};
pub use uuid::RecordUuid;

// Re-export the validated text primitives so downstream crates take them
// from one place.
pub use sickbay_types::{EmailAddress, NonEmptyText, TextError};
