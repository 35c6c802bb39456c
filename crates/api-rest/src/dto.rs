//! Wire types for the REST surface.
//!
//! Requests arrive as loosely-typed JSON (enums and dates as strings) and are
//! parsed into the core's validated input types here, so a bad value surfaces
//! as a 400 with a useful message rather than a generic rejection. Responses
//! are projections: references come back resolved as nested display objects,
//! the way clients consume them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sickbay_core::staff::{NewStaff, StaffProfile};
use sickbay_core::students::{NewStudent, Student, StudentSummary, StudentUpdate};
use sickbay_core::visits::{NewVisit, VisitAmendment, VisitView};
use sickbay_core::{
    ClinicError, ClinicResult, EmailAddress, NonEmptyText, RecordUuid, Role,
};
use utoipa::ToSchema;

fn parse_date(field: &str, value: Option<String>) -> ClinicResult<Option<NaiveDate>> {
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ClinicError::InvalidInput(format!("{field} must be an ISO date (YYYY-MM-DD)"))),
    }
}

/// Error and status-message body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageRes {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Auth and staff

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffProfileRes {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: String,
}

impl From<StaffProfile> for StaffProfileRes {
    fn from(p: StaffProfile) -> Self {
        Self {
            id: p.id.to_string(),
            full_name: p.full_name,
            email: p.email.to_string(),
            role: p.role.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRes {
    pub token: String,
    pub staff: StaffProfileRes,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterStaffReq {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

impl RegisterStaffReq {
    pub fn into_new_staff(self) -> ClinicResult<NewStaff> {
        Ok(NewStaff {
            full_name: NonEmptyText::new(&self.full_name)?,
            email: EmailAddress::parse(&self.email)?,
            password: NonEmptyText::new(&self.password)?,
            role: self.role.parse::<Role>()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Students

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentReq {
    pub full_name: String,
    pub admission_no: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub student_type: String,
    #[serde(default)]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub genotype: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub chronic_condition: Option<String>,
    pub parent_phone: String,
}

impl StudentReq {
    pub fn into_new_student(self) -> ClinicResult<NewStudent> {
        Ok(NewStudent {
            full_name: NonEmptyText::new(&self.full_name)?,
            admission_no: NonEmptyText::new(&self.admission_no)?,
            class_name: NonEmptyText::new(&self.class_name)?,
            student_type: self.student_type.parse()?,
            blood_group: self.blood_group,
            genotype: self.genotype,
            allergies: self.allergies,
            chronic_condition: self.chronic_condition,
            parent_phone: NonEmptyText::new(&self.parent_phone)?,
        })
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentUpdateReq {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub admission_no: Option<String>,
    #[serde(default, rename = "class")]
    pub class_name: Option<String>,
    #[serde(default)]
    pub student_type: Option<String>,
    #[serde(default)]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub genotype: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub chronic_condition: Option<String>,
    #[serde(default)]
    pub parent_phone: Option<String>,
}

impl StudentUpdateReq {
    pub fn into_update(self) -> ClinicResult<StudentUpdate> {
        let student_type = match self.student_type {
            Some(s) if !s.trim().is_empty() => Some(s.parse()?),
            _ => None,
        };
        Ok(StudentUpdate {
            full_name: self.full_name,
            admission_no: self.admission_no,
            class_name: self.class_name,
            student_type,
            blood_group: self.blood_group,
            genotype: self.genotype,
            allergies: self.allergies,
            chronic_condition: self.chronic_condition,
            parent_phone: self.parent_phone,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentRes {
    pub id: String,
    pub full_name: String,
    pub admission_no: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub student_type: String,
    pub blood_group: Option<String>,
    pub genotype: Option<String>,
    pub allergies: Option<String>,
    pub chronic_condition: Option<String>,
    pub parent_phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Student> for StudentRes {
    fn from(s: Student) -> Self {
        Self {
            id: s.id.to_string(),
            full_name: s.full_name,
            admission_no: s.admission_no,
            class_name: s.class_name,
            student_type: s.student_type.to_string(),
            blood_group: s.blood_group,
            genotype: s.genotype,
            allergies: s.allergies,
            chronic_condition: s.chronic_condition,
            parent_phone: s.parent_phone,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Visits

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVisitReq {
    pub student_id: String,
    pub symptoms: String,
    pub diagnosis: String,
    pub treatment: String,
    #[serde(default)]
    pub drugs: Option<String>,
    pub outcome: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub spo2: Option<f64>,
    #[serde(default)]
    pub pulse: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub follow_up_required: bool,
    #[serde(default)]
    pub follow_up_date: Option<String>,
    #[serde(default)]
    pub follow_up_note: Option<String>,
}

impl CreateVisitReq {
    pub fn into_new_visit(self) -> ClinicResult<NewVisit> {
        Ok(NewVisit {
            student_id: RecordUuid::parse(&self.student_id)?,
            symptoms: NonEmptyText::new(&self.symptoms)?,
            diagnosis: NonEmptyText::new(&self.diagnosis)?,
            treatment: NonEmptyText::new(&self.treatment)?,
            drugs: self.drugs,
            outcome: self.outcome.parse()?,
            temperature: self.temperature,
            spo2: self.spo2,
            pulse: self.pulse,
            weight: self.weight,
            follow_up_required: self.follow_up_required,
            follow_up_date: parse_date("followUpDate", self.follow_up_date)?,
            follow_up_note: self.follow_up_note,
        })
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVisitReq {
    #[serde(default)]
    pub symptoms: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub treatment: Option<String>,
    #[serde(default)]
    pub drugs: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub spo2: Option<f64>,
    #[serde(default)]
    pub pulse: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub follow_up_required: Option<bool>,
    #[serde(default)]
    pub follow_up_date: Option<String>,
    #[serde(default)]
    pub follow_up_note: Option<String>,
}

impl UpdateVisitReq {
    pub fn into_amendment(self) -> ClinicResult<VisitAmendment> {
        let outcome = match self.outcome {
            Some(s) if !s.trim().is_empty() => Some(s.parse()?),
            _ => None,
        };
        Ok(VisitAmendment {
            symptoms: self.symptoms,
            diagnosis: self.diagnosis,
            treatment: self.treatment,
            drugs: self.drugs,
            outcome,
            temperature: self.temperature,
            spo2: self.spo2,
            pulse: self.pulse,
            weight: self.weight,
            follow_up_required: self.follow_up_required,
            follow_up_date: parse_date("followUpDate", self.follow_up_date)?,
            follow_up_note: self.follow_up_note,
        })
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalDetailsReq {
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub drugs: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReq {
    pub doctor_comment: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FollowUpReportReq {
    pub report: String,
}

/// Resolved staff reference as clients render it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffNameRes {
    pub full_name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummaryRes {
    pub full_name: String,
    pub admission_no: String,
    #[serde(rename = "class")]
    pub class_name: String,
}

impl From<StudentSummary> for StudentSummaryRes {
    fn from(s: StudentSummary) -> Self {
        Self {
            full_name: s.full_name,
            admission_no: s.admission_no,
            class_name: s.class_name,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpReportRes {
    pub note: String,
    pub added_by: Option<StaffNameRes>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitRes {
    pub id: String,
    pub student: Option<StudentSummaryRes>,
    pub symptoms: String,
    pub diagnosis: String,
    pub treatment: String,
    pub drugs: Option<String>,
    pub temperature: Option<f64>,
    pub spo2: Option<f64>,
    pub pulse: Option<f64>,
    pub weight: Option<f64>,
    pub outcome: String,
    pub attended_by: Option<StaffNameRes>,
    pub is_viewed: bool,
    pub is_reviewed: bool,
    pub doctor_comment: Option<String>,
    pub reviewed_by: Option<StaffNameRes>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub follow_up_required: bool,
    pub follow_up_date: Option<NaiveDate>,
    pub follow_up_note: Option<String>,
    pub follow_up_reports: Vec<FollowUpReportRes>,
    pub is_follow_up_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VisitView> for VisitRes {
    fn from(view: VisitView) -> Self {
        let visit = view.visit;
        Self {
            id: visit.id.to_string(),
            student: view.student.map(Into::into),
            symptoms: visit.symptoms,
            diagnosis: visit.diagnosis,
            treatment: visit.treatment,
            drugs: visit.drugs,
            temperature: visit.temperature,
            spo2: visit.spo2,
            pulse: visit.pulse,
            weight: visit.weight,
            outcome: visit.outcome.to_string(),
            attended_by: view
                .attended_by_name
                .map(|full_name| StaffNameRes { full_name }),
            is_viewed: visit.is_viewed,
            is_reviewed: visit.is_reviewed,
            doctor_comment: visit.doctor_comment,
            reviewed_by: view
                .reviewed_by_name
                .map(|full_name| StaffNameRes { full_name }),
            reviewed_at: visit.reviewed_at,
            follow_up_required: visit.follow_up_required,
            follow_up_date: visit.follow_up_date,
            follow_up_note: visit.follow_up_note,
            follow_up_reports: view
                .follow_up_reports
                .into_iter()
                .map(|r| FollowUpReportRes {
                    note: r.note,
                    added_by: r.added_by_name.map(|full_name| StaffNameRes { full_name }),
                    created_at: r.created_at,
                })
                .collect(),
            is_follow_up_completed: visit.is_follow_up_completed,
            created_at: visit.created_at,
            updated_at: visit.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Notification tracker and dashboard

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnreadCountRes {
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkViewedRes {
    pub updated: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentDistributionRes {
    pub boarders: usize,
    pub day_students: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRes {
    pub total_students: usize,
    pub total_visits: usize,
    pub total_nurses: usize,
    pub student_distribution: StudentDistributionRes,
}
