//! Access policy evaluator.
//!
//! One table maps each operation to the roles that may perform it. Services
//! call [`authorise`] before doing anything else, so the policy lives in one
//! place instead of being scattered through the operations.
//!
//! A role mismatch is [`ClinicError::Unauthorized`], which is distinct from
//! [`ClinicError::AuthenticationMissing`] (no valid credential at all). Both
//! surface to clients as an access denial, but they are logged differently
//! for audit purposes.

use crate::caller::{Caller, Role};
use crate::error::{ClinicError, ClinicResult};

/// Operations gated by the access policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateVisit,
    ListVisits,
    GetVisit,
    AmendVisit,
    AmendClinicalDetails,
    ReviewVisit,
    AddFollowUpReport,
    CountUnreadVisits,
    MarkVisitsViewed,
    CreateStudent,
    ListStudents,
    GetStudent,
    UpdateStudent,
    DeleteStudent,
    RegisterStaff,
    ListStaff,
    ViewDashboard,
}

impl Action {
    /// Returns the roles permitted to perform this action.
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            // Visit lifecycle
            Action::CreateVisit | Action::AmendVisit | Action::AddFollowUpReport => {
                &[Role::Nurse]
            }
            Action::AmendClinicalDetails | Action::ReviewVisit => &[Role::Doctor],
            Action::ListVisits | Action::GetVisit => &Role::ALL,

            // Notification tracker
            Action::CountUnreadVisits | Action::MarkVisitsViewed => &[Role::Admin],

            // Student directory
            Action::CreateStudent | Action::UpdateStudent | Action::DeleteStudent => {
                &[Role::Admin]
            }
            Action::ListStudents | Action::GetStudent => &Role::ALL,

            // Staff registry and dashboard
            Action::RegisterStaff | Action::ListStaff | Action::ViewDashboard => &[Role::Admin],
        }
    }

    /// Short name used in audit log lines.
    pub fn name(self) -> &'static str {
        match self {
            Action::CreateVisit => "create_visit",
            Action::ListVisits => "list_visits",
            Action::GetVisit => "get_visit",
            Action::AmendVisit => "amend_visit",
            Action::AmendClinicalDetails => "amend_clinical_details",
            Action::ReviewVisit => "review_visit",
            Action::AddFollowUpReport => "add_follow_up_report",
            Action::CountUnreadVisits => "count_unread_visits",
            Action::MarkVisitsViewed => "mark_visits_viewed",
            Action::CreateStudent => "create_student",
            Action::ListStudents => "list_students",
            Action::GetStudent => "get_student",
            Action::UpdateStudent => "update_student",
            Action::DeleteStudent => "delete_student",
            Action::RegisterStaff => "register_staff",
            Action::ListStaff => "list_staff",
            Action::ViewDashboard => "view_dashboard",
        }
    }

    /// Human-readable description of the required roles, used in the error
    /// surfaced to the caller.
    fn required_description(self) -> &'static str {
        match self.allowed_roles() {
            [Role::Admin] => "an admin",
            [Role::Doctor] => "a doctor",
            [Role::Nurse] => "a nurse",
            _ => "an authenticated staff member",
        }
    }
}

/// Checks that `caller` may perform `action`.
///
/// # Errors
///
/// Returns [`ClinicError::Unauthorized`] on a role mismatch. The denial is
/// logged at `warn` with the caller's id and role so access attempts can be
/// audited.
pub fn authorise(caller: &Caller, action: Action) -> ClinicResult<()> {
    if action.allowed_roles().contains(&caller.role) {
        return Ok(());
    }

    tracing::warn!(
        caller = %caller.id,
        role = %caller.role,
        action = action.name(),
        "access denied: role not permitted"
    );

    Err(ClinicError::Unauthorized {
        required: action.required_description(),
    })
}
