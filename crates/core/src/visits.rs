//! Clinic visit lifecycle engine.
//!
//! Owns creation, amendment, doctor review, follow-up reporting, and the
//! administrative read-state of visit records. Every operation takes an
//! explicit [`Caller`] and evaluates the access policy before touching
//! storage.
//!
//! ## Lifecycle
//!
//! A visit is created by a nurse, may be amended any number of times (full
//! edits by nurses, diagnosis/drugs-only edits by doctors), reviewed by a
//! doctor, and accumulates append-only follow-up reports filed by nurses.
//! Review is repeatable: a second review overwrites the comment, reviewer,
//! and timestamp as a correction mechanism. There is no delete operation —
//! visits are permanent audit records.
//!
//! ## Reference handling
//!
//! Visits store identifiers only. Student existence is checked explicitly at
//! creation through the injected [`StudentDirectory`], and display
//! projections are resolved at the read boundary through [`StudentDirectory`]
//! and [`StaffNames`] — never denormalised into the stored document.

use crate::caller::Caller;
use crate::config::CoreConfig;
use crate::constants::VISIT_JSON_FILENAME;
use crate::error::{ClinicError, ClinicResult};
use crate::policy::{authorise, Action};
use crate::staff::StaffNames;
use crate::store;
use crate::students::{StudentDirectory, StudentSummary};
use crate::uuid::RecordUuid;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sickbay_types::NonEmptyText;
use std::fmt;
use std::sync::Arc;

/// Where the student went after the visit. Closed set; required at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "Returned to Class")]
    ReturnedToClass,
    #[serde(rename = "Sent to Hostel")]
    SentToHostel,
    #[serde(rename = "Sent Home")]
    SentHome,
    #[serde(rename = "Referred to Hospital")]
    ReferredToHospital,
    #[serde(rename = "Under Observation")]
    UnderObservation,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::ReturnedToClass => "Returned to Class",
            Outcome::SentToHostel => "Sent to Hostel",
            Outcome::SentHome => "Sent Home",
            Outcome::ReferredToHospital => "Referred to Hospital",
            Outcome::UnderObservation => "Under Observation",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Outcome {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Returned to Class" => Ok(Outcome::ReturnedToClass),
            "Sent to Hostel" => Ok(Outcome::SentToHostel),
            "Sent Home" => Ok(Outcome::SentHome),
            "Referred to Hospital" => Ok(Outcome::ReferredToHospital),
            "Under Observation" => Ok(Outcome::UnderObservation),
            other => Err(ClinicError::InvalidInput(format!(
                "outcome must be one of the fixed set, got: '{other}'"
            ))),
        }
    }
}

/// One append-only follow-up entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpReport {
    pub note: String,
    pub added_by: RecordUuid,
    pub created_at: DateTime<Utc>,
}

/// A clinic visit as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: RecordUuid,
    /// Immutable after creation; no operation changes which student a visit
    /// belongs to.
    pub student_id: RecordUuid,
    pub symptoms: String,
    pub diagnosis: String,
    pub treatment: String,
    #[serde(default)]
    pub drugs: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub spo2: Option<f64>,
    #[serde(default)]
    pub pulse: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    pub outcome: Outcome,
    /// The nurse who created the visit; set once, never changed.
    pub attended_by: RecordUuid,
    /// Administrative read-tracking flag, distinct from medical review.
    #[serde(default)]
    pub is_viewed: bool,
    #[serde(default)]
    pub is_reviewed: bool,
    #[serde(default)]
    pub doctor_comment: Option<String>,
    #[serde(default)]
    pub reviewed_by: Option<RecordUuid>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub follow_up_required: bool,
    #[serde(default)]
    pub follow_up_date: Option<NaiveDate>,
    #[serde(default)]
    pub follow_up_note: Option<String>,
    /// Append-only; entries are never edited or removed, insertion order is
    /// chronological.
    #[serde(default)]
    pub follow_up_reports: Vec<FollowUpReport>,
    /// Maintained invariant: true iff `follow_up_reports` is non-empty.
    #[serde(default)]
    pub is_follow_up_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a visit. Required clinical fields are validated at the
/// type level.
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub student_id: RecordUuid,
    pub symptoms: NonEmptyText,
    pub diagnosis: NonEmptyText,
    pub treatment: NonEmptyText,
    pub drugs: Option<String>,
    pub outcome: Outcome,
    pub temperature: Option<f64>,
    pub spo2: Option<f64>,
    pub pulse: Option<f64>,
    pub weight: Option<f64>,
    pub follow_up_required: bool,
    pub follow_up_date: Option<NaiveDate>,
    pub follow_up_note: Option<String>,
}

/// Partial amendment for the nurse's full-edit surface.
///
/// Field semantics are deliberately asymmetric:
/// - text fields use "provided-and-non-empty overrides, omitted or blank
///   leaves unchanged";
/// - vitals, `follow_up_required`, and `follow_up_date` use "provided
///   overrides even when falsy, omitted leaves unchanged", because zero-valued
///   vitals are legitimate inputs that a blanket truthy rule would silently
///   discard.
#[derive(Debug, Clone, Default)]
pub struct VisitAmendment {
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub drugs: Option<String>,
    pub outcome: Option<Outcome>,
    pub temperature: Option<f64>,
    pub spo2: Option<f64>,
    pub pulse: Option<f64>,
    pub weight: Option<f64>,
    pub follow_up_required: Option<bool>,
    pub follow_up_date: Option<NaiveDate>,
    pub follow_up_note: Option<String>,
}

/// A follow-up report with its author resolved for display.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowUpReportView {
    pub note: String,
    pub added_by: RecordUuid,
    pub added_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A visit with its references resolved to display projections.
///
/// Resolution happens only here, at the read boundary; the stored document
/// carries identifiers alone. A `None` projection means the referenced record
/// no longer resolves (e.g. a deleted student) — the visit itself is still
/// returned.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitView {
    pub visit: Visit,
    pub student: Option<StudentSummary>,
    pub attended_by_name: Option<String>,
    pub reviewed_by_name: Option<String>,
    pub follow_up_reports: Vec<FollowUpReportView>,
}

/// Service owning the visit lifecycle and read-state tracker.
#[derive(Clone)]
pub struct VisitService {
    cfg: Arc<CoreConfig>,
    students: Arc<dyn StudentDirectory>,
    staff: Arc<dyn StaffNames>,
}

impl VisitService {
    pub fn new(
        cfg: Arc<CoreConfig>,
        students: Arc<dyn StudentDirectory>,
        staff: Arc<dyn StaffNames>,
    ) -> Self {
        Self {
            cfg,
            students,
            staff,
        }
    }

    fn read(&self, id: &RecordUuid) -> ClinicResult<Visit> {
        let path = store::document_path(&self.cfg.visits_dir(), id, VISIT_JSON_FILENAME);
        if !path.is_file() {
            return Err(ClinicError::NotFound("visit"));
        }
        store::read_json(&path)
    }

    fn write(&self, visit: &Visit) -> ClinicResult<()> {
        let path = store::document_path(&self.cfg.visits_dir(), &visit.id, VISIT_JSON_FILENAME);
        store::write_json_atomic(&path, visit)
    }

    fn resolve(&self, visit: Visit) -> ClinicResult<VisitView> {
        let student = self.students.summary(&visit.student_id)?;
        let attended_by_name = self.staff.full_name(&visit.attended_by)?;
        let reviewed_by_name = match &visit.reviewed_by {
            Some(id) => self.staff.full_name(id)?,
            None => None,
        };

        let mut follow_up_reports = Vec::with_capacity(visit.follow_up_reports.len());
        for report in &visit.follow_up_reports {
            follow_up_reports.push(FollowUpReportView {
                note: report.note.clone(),
                added_by: report.added_by.clone(),
                added_by_name: self.staff.full_name(&report.added_by)?,
                created_at: report.created_at,
            });
        }

        Ok(VisitView {
            visit,
            student,
            attended_by_name,
            reviewed_by_name,
            follow_up_reports,
        })
    }

    /// Creates a visit record. Nurse only.
    ///
    /// The student reference is checked explicitly against the directory;
    /// storage-level behaviour is never relied on for reference validity.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidReference`] if the student does not
    /// exist.
    pub fn create(&self, caller: &Caller, new: NewVisit) -> ClinicResult<Visit> {
        authorise(caller, Action::CreateVisit)?;

        if !self.students.exists(&new.student_id)? {
            return Err(ClinicError::InvalidReference(new.student_id.to_string()));
        }

        let (id, dir) = store::create_record_dir(&self.cfg.visits_dir(), RecordUuid::new)?;
        let now = Utc::now();

        let visit = Visit {
            id,
            student_id: new.student_id,
            symptoms: new.symptoms.into_inner(),
            diagnosis: new.diagnosis.into_inner(),
            treatment: new.treatment.into_inner(),
            drugs: new.drugs,
            temperature: new.temperature,
            spo2: new.spo2,
            pulse: new.pulse,
            weight: new.weight,
            outcome: new.outcome,
            attended_by: caller.id.clone(),
            is_viewed: false,
            is_reviewed: false,
            doctor_comment: None,
            reviewed_by: None,
            reviewed_at: None,
            follow_up_required: new.follow_up_required,
            follow_up_date: new.follow_up_date,
            follow_up_note: new.follow_up_note,
            follow_up_reports: Vec::new(),
            is_follow_up_completed: false,
            created_at: now,
            updated_at: now,
        };

        store::write_json_atomic(&dir.join(VISIT_JSON_FILENAME), &visit)?;
        tracing::info!(visit = %visit.id, student = %visit.student_id, "visit created");

        Ok(visit)
    }

    /// Lists visits, optionally scoped to one student, newest first.
    /// Any authenticated role. No side effects.
    pub fn list(
        &self,
        caller: &Caller,
        student_id: Option<&RecordUuid>,
    ) -> ClinicResult<Vec<VisitView>> {
        authorise(caller, Action::ListVisits)?;

        let mut visits: Vec<Visit> = store::read_all(&self.cfg.visits_dir(), VISIT_JSON_FILENAME);
        if let Some(student_id) = student_id {
            visits.retain(|v| &v.student_id == student_id);
        }
        visits.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        visits.into_iter().map(|v| self.resolve(v)).collect()
    }

    /// Returns one visit with all references resolved. Any authenticated role.
    pub fn get(&self, caller: &Caller, id: &RecordUuid) -> ClinicResult<VisitView> {
        authorise(caller, Action::GetVisit)?;
        let visit = self.read(id)?;
        self.resolve(visit)
    }

    /// Applies a full amendment. Nurse only.
    ///
    /// Permitted before or after doctor review; the record keeps no edit
    /// lock.
    pub fn amend_full(
        &self,
        caller: &Caller,
        id: &RecordUuid,
        amendment: VisitAmendment,
    ) -> ClinicResult<Visit> {
        authorise(caller, Action::AmendVisit)?;

        let mut visit = self.read(id)?;

        fn override_text(target: &mut String, value: Option<String>) {
            if let Some(v) = value {
                if !v.trim().is_empty() {
                    *target = v;
                }
            }
        }
        fn override_optional_text(target: &mut Option<String>, value: Option<String>) {
            if let Some(v) = value {
                if !v.trim().is_empty() {
                    *target = Some(v);
                }
            }
        }

        override_text(&mut visit.symptoms, amendment.symptoms);
        override_text(&mut visit.diagnosis, amendment.diagnosis);
        override_text(&mut visit.treatment, amendment.treatment);
        override_optional_text(&mut visit.drugs, amendment.drugs);
        override_optional_text(&mut visit.follow_up_note, amendment.follow_up_note);

        if let Some(outcome) = amendment.outcome {
            visit.outcome = outcome;
        }

        // Provided-overrides-even-if-falsy: Some(0.0) sets a vital to zero.
        if let Some(v) = amendment.temperature {
            visit.temperature = Some(v);
        }
        if let Some(v) = amendment.spo2 {
            visit.spo2 = Some(v);
        }
        if let Some(v) = amendment.pulse {
            visit.pulse = Some(v);
        }
        if let Some(v) = amendment.weight {
            visit.weight = Some(v);
        }
        if let Some(v) = amendment.follow_up_required {
            visit.follow_up_required = v;
        }
        if let Some(v) = amendment.follow_up_date {
            visit.follow_up_date = Some(v);
        }

        visit.updated_at = Utc::now();
        self.write(&visit)?;

        Ok(visit)
    }

    /// Amends diagnosis and drugs only. Doctor only.
    ///
    /// Narrower than [`VisitService::amend_full`]: doctors refine the
    /// diagnosis and prescription without touching the nurse's observational
    /// record (symptoms, vitals, outcome).
    pub fn amend_clinical(
        &self,
        caller: &Caller,
        id: &RecordUuid,
        diagnosis: Option<String>,
        drugs: Option<String>,
    ) -> ClinicResult<Visit> {
        authorise(caller, Action::AmendClinicalDetails)?;

        let mut visit = self.read(id)?;

        if let Some(v) = diagnosis {
            if !v.trim().is_empty() {
                visit.diagnosis = v;
            }
        }
        if let Some(v) = drugs {
            if !v.trim().is_empty() {
                visit.drugs = Some(v);
            }
        }

        visit.updated_at = Utc::now();
        self.write(&visit)?;

        Ok(visit)
    }

    /// Records the doctor's review annotation. Doctor only.
    ///
    /// Review is repeatable: calling it again overwrites the comment,
    /// reviewer, and timestamp. This is the documented correction mechanism
    /// rather than a one-shot lock.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidInput`] for an empty comment.
    pub fn review(&self, caller: &Caller, id: &RecordUuid, comment: &str) -> ClinicResult<Visit> {
        authorise(caller, Action::ReviewVisit)?;

        let comment = comment.trim();
        if comment.is_empty() {
            return Err(ClinicError::InvalidInput(
                "doctor comment cannot be empty".into(),
            ));
        }

        let mut visit = self.read(id)?;

        visit.doctor_comment = Some(comment.to_owned());
        visit.is_reviewed = true;
        visit.reviewed_by = Some(caller.id.clone());
        visit.reviewed_at = Some(Utc::now());
        visit.updated_at = Utc::now();
        self.write(&visit)?;

        tracing::info!(visit = %visit.id, doctor = %caller.id, "visit reviewed");
        Ok(visit)
    }

    /// Appends a follow-up report. Nurse only.
    ///
    /// Reports are strictly append-ordered; nothing ever edits or removes an
    /// entry. Appending the first report flips `is_follow_up_completed`.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidInput`] for an empty note.
    pub fn add_follow_up_report(
        &self,
        caller: &Caller,
        id: &RecordUuid,
        note: &str,
    ) -> ClinicResult<Visit> {
        authorise(caller, Action::AddFollowUpReport)?;

        let note = note.trim();
        if note.is_empty() {
            return Err(ClinicError::InvalidInput(
                "follow-up report cannot be empty".into(),
            ));
        }

        let mut visit = self.read(id)?;

        visit.follow_up_reports.push(FollowUpReport {
            note: note.to_owned(),
            added_by: caller.id.clone(),
            created_at: Utc::now(),
        });
        visit.is_follow_up_completed = true;
        visit.updated_at = Utc::now();
        self.write(&visit)?;

        Ok(visit)
    }

    /// Returns the number of visits not yet seen by an administrator.
    /// Admin only; side-effect free.
    pub fn count_unread(&self, caller: &Caller) -> ClinicResult<usize> {
        authorise(caller, Action::CountUnreadVisits)?;

        let visits: Vec<Visit> = store::read_all(&self.cfg.visits_dir(), VISIT_JSON_FILENAME);
        Ok(visits.iter().filter(|v| !v.is_viewed).count())
    }

    /// Marks every unviewed visit as viewed. Admin only.
    ///
    /// Delegates to the store's bulk-update primitive: each document is
    /// rewritten atomically, and already-viewed visits are untouched, so a
    /// second call is a no-op. Returns the number of visits flipped.
    pub fn mark_all_viewed(&self, caller: &Caller) -> ClinicResult<usize> {
        authorise(caller, Action::MarkVisitsViewed)?;

        store::update_each::<Visit, _>(&self.cfg.visits_dir(), VISIT_JSON_FILENAME, |visit| {
            if !visit.is_viewed {
                visit.is_viewed = true;
                true
            } else {
                false
            }
        })
    }

    /// Total number of visit records. Used by the dashboard.
    pub(crate) fn count_all(&self) -> usize {
        store::read_all::<Visit>(&self.cfg.visits_dir(), VISIT_JSON_FILENAME).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caller::Role;
    use crate::staff::{NewStaff, StaffService};
    use crate::students::{NewStudent, StudentService, StudentType};
    use sickbay_types::EmailAddress;
    use std::str::FromStr;
    use tempfile::TempDir;

    /// A clinic with one admin, one nurse, one doctor, and one student.
    struct TestClinic {
        _temp_dir: TempDir,
        visits: VisitService,
        students: StudentService,
        admin: Caller,
        nurse: Caller,
        doctor: Caller,
        student_id: RecordUuid,
    }

    impl TestClinic {
        fn new() -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp dir");
            let cfg = Arc::new(
                CoreConfig::new(temp_dir.path().to_path_buf())
                    .expect("CoreConfig::new should succeed"),
            );

            let staff = StaffService::new(cfg.clone());
            let students = StudentService::new(cfg.clone());

            let mut seed_staff = |name: &str, email: &str, role: Role| -> Caller {
                let profile = staff
                    .create_account(NewStaff {
                        full_name: NonEmptyText::new(name).unwrap(),
                        email: EmailAddress::parse(email).unwrap(),
                        password: NonEmptyText::new("secret").unwrap(),
                        role,
                    })
                    .expect("seeding staff should succeed");
                Caller {
                    id: profile.id,
                    role,
                    full_name: profile.full_name,
                }
            };

            let admin = seed_staff("Ada Admin", "admin@school.ng", Role::Admin);
            let nurse = seed_staff("Nurse Joy", "nurse@school.ng", Role::Nurse);
            let doctor = seed_staff("Dr Bassey", "doctor@school.ng", Role::Doctor);

            let student = students
                .create(
                    &admin,
                    NewStudent {
                        full_name: NonEmptyText::new("Ada Obi").unwrap(),
                        admission_no: NonEmptyText::new("ADM-001").unwrap(),
                        class_name: NonEmptyText::new("JSS2").unwrap(),
                        student_type: StudentType::Boarder,
                        blood_group: None,
                        genotype: None,
                        allergies: None,
                        chronic_condition: None,
                        parent_phone: NonEmptyText::new("08030000000").unwrap(),
                    },
                )
                .expect("seeding student should succeed");

            let visits = VisitService::new(
                cfg,
                Arc::new(students.clone()),
                Arc::new(staff),
            );

            Self {
                _temp_dir: temp_dir,
                visits,
                students,
                admin,
                nurse,
                doctor,
                student_id: student.id,
            }
        }

        fn new_visit(&self) -> NewVisit {
            NewVisit {
                student_id: self.student_id.clone(),
                symptoms: NonEmptyText::new("fever").unwrap(),
                diagnosis: NonEmptyText::new("flu").unwrap(),
                treatment: NonEmptyText::new("rest").unwrap(),
                drugs: None,
                outcome: Outcome::SentHome,
                temperature: Some(38.4),
                spo2: None,
                pulse: None,
                weight: None,
                follow_up_required: false,
                follow_up_date: None,
                follow_up_note: None,
            }
        }

        fn create_visit(&self) -> Visit {
            self.visits
                .create(&self.nurse, self.new_visit())
                .expect("visit creation should succeed")
        }
    }

    #[test]
    fn creation_sets_all_tracking_flags_false() {
        let clinic = TestClinic::new();
        let visit = clinic.create_visit();

        assert!(!visit.is_viewed, "new visit must be unviewed");
        assert!(!visit.is_reviewed, "new visit must be unreviewed");
        assert!(
            !visit.is_follow_up_completed,
            "new visit must have no follow-up reports"
        );
        assert!(visit.follow_up_reports.is_empty());
        assert_eq!(visit.attended_by, clinic.nurse.id);
        assert_eq!(visit.created_at, visit.updated_at);
    }

    #[test]
    fn create_rejects_nonexistent_student() {
        let clinic = TestClinic::new();
        let mut new = clinic.new_visit();
        new.student_id = RecordUuid::new();

        let err = clinic
            .visits
            .create(&clinic.nurse, new)
            .expect_err("unknown student reference should be rejected");
        assert!(matches!(err, ClinicError::InvalidReference(_)));
    }

    #[test]
    fn create_is_nurse_only() {
        let clinic = TestClinic::new();

        for caller in [&clinic.doctor, &clinic.admin] {
            let err = clinic
                .visits
                .create(caller, clinic.new_visit())
                .expect_err("only nurses create visits");
            assert!(matches!(err, ClinicError::Unauthorized { .. }));
        }
    }

    #[test]
    fn outcome_parses_only_the_fixed_set() {
        assert_eq!(
            Outcome::from_str("Referred to Hospital").unwrap(),
            Outcome::ReferredToHospital
        );
        assert!(Outcome::from_str("Sent to Narnia").is_err());
        assert!(Outcome::from_str("").is_err());
    }

    #[test]
    fn list_returns_newest_first_with_resolved_references() {
        let clinic = TestClinic::new();
        let first = clinic.create_visit();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = clinic.create_visit();

        let listed = clinic
            .visits
            .list(&clinic.admin, None)
            .expect("admin can list visits");

        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].visit.id, second.id, "newest visit comes first");
        assert_eq!(listed[1].visit.id, first.id);

        let view = &listed[0];
        let student = view.student.as_ref().expect("student should resolve");
        assert_eq!(student.full_name, "Ada Obi");
        assert_eq!(student.admission_no, "ADM-001");
        assert_eq!(student.class_name, "JSS2");
        assert_eq!(view.attended_by_name.as_deref(), Some("Nurse Joy"));
        assert!(view.reviewed_by_name.is_none());
    }

    #[test]
    fn list_filters_by_student() {
        let clinic = TestClinic::new();
        clinic.create_visit();

        let other_student = clinic
            .students
            .create(
                &clinic.admin,
                NewStudent {
                    full_name: NonEmptyText::new("Bola Ade").unwrap(),
                    admission_no: NonEmptyText::new("ADM-002").unwrap(),
                    class_name: NonEmptyText::new("SS1").unwrap(),
                    student_type: StudentType::Day,
                    blood_group: None,
                    genotype: None,
                    allergies: None,
                    chronic_condition: None,
                    parent_phone: NonEmptyText::new("08030000001").unwrap(),
                },
            )
            .expect("second student should be created");

        let mut new = clinic.new_visit();
        new.student_id = other_student.id.clone();
        clinic
            .visits
            .create(&clinic.nurse, new)
            .expect("second visit should be created");

        let scoped = clinic
            .visits
            .list(&clinic.nurse, Some(&other_student.id))
            .expect("scoped listing should succeed");
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].visit.student_id, other_student.id);
    }

    #[test]
    fn get_returns_not_found_for_unknown_id() {
        let clinic = TestClinic::new();
        let err = clinic
            .visits
            .get(&clinic.nurse, &RecordUuid::new())
            .expect_err("unknown visit should not resolve");
        assert!(matches!(err, ClinicError::NotFound("visit")));
    }

    #[test]
    fn amend_full_zero_valued_vital_overrides() {
        let clinic = TestClinic::new();
        let visit = clinic.create_visit();

        let amended = clinic
            .visits
            .amend_full(
                &clinic.nurse,
                &visit.id,
                VisitAmendment {
                    temperature: Some(0.0),
                    ..VisitAmendment::default()
                },
            )
            .expect("amendment should succeed");

        assert_eq!(
            amended.temperature,
            Some(0.0),
            "zero-valued vital must override, not be discarded"
        );
    }

    #[test]
    fn amend_full_blank_text_leaves_existing_value() {
        let clinic = TestClinic::new();
        let visit = clinic.create_visit();

        let amended = clinic
            .visits
            .amend_full(
                &clinic.nurse,
                &visit.id,
                VisitAmendment {
                    symptoms: Some("  ".into()),
                    diagnosis: Some("malaria".into()),
                    ..VisitAmendment::default()
                },
            )
            .expect("amendment should succeed");

        assert_eq!(amended.symptoms, "fever", "blank text field is ignored");
        assert_eq!(amended.diagnosis, "malaria");
        assert!(amended.updated_at > visit.updated_at);
    }

    #[test]
    fn amend_full_is_permitted_after_review() {
        let clinic = TestClinic::new();
        let visit = clinic.create_visit();
        clinic
            .visits
            .review(&clinic.doctor, &visit.id, "reviewed")
            .expect("review should succeed");

        let amended = clinic
            .visits
            .amend_full(
                &clinic.nurse,
                &visit.id,
                VisitAmendment {
                    treatment: Some("rest and fluids".into()),
                    ..VisitAmendment::default()
                },
            )
            .expect("amendment after review is unconditional");
        assert_eq!(amended.treatment, "rest and fluids");
        assert!(amended.is_reviewed, "review state is untouched");
    }

    #[test]
    fn amend_full_is_nurse_only() {
        let clinic = TestClinic::new();
        let visit = clinic.create_visit();

        let err = clinic
            .visits
            .amend_full(&clinic.doctor, &visit.id, VisitAmendment::default())
            .expect_err("doctors use the clinical-details surface instead");
        assert!(matches!(err, ClinicError::Unauthorized { .. }));
    }

    #[test]
    fn amend_clinical_touches_only_diagnosis_and_drugs() {
        let clinic = TestClinic::new();
        let visit = clinic.create_visit();

        let amended = clinic
            .visits
            .amend_clinical(
                &clinic.doctor,
                &visit.id,
                Some("typhoid".into()),
                Some("ciprofloxacin".into()),
            )
            .expect("clinical amendment should succeed");

        assert_eq!(amended.diagnosis, "typhoid");
        assert_eq!(amended.drugs.as_deref(), Some("ciprofloxacin"));
        assert_eq!(amended.symptoms, visit.symptoms, "symptoms are untouched");
        assert_eq!(amended.outcome, visit.outcome, "outcome is untouched");
    }

    #[test]
    fn amend_clinical_blank_input_leaves_existing_values() {
        let clinic = TestClinic::new();
        let visit = clinic.create_visit();

        let amended = clinic
            .visits
            .amend_clinical(&clinic.doctor, &visit.id, Some(String::new()), None)
            .expect("clinical amendment should succeed");
        assert_eq!(amended.diagnosis, visit.diagnosis);
        assert_eq!(amended.drugs, visit.drugs);
    }

    #[test]
    fn amend_clinical_is_doctor_only() {
        let clinic = TestClinic::new();
        let visit = clinic.create_visit();

        let err = clinic
            .visits
            .amend_clinical(&clinic.nurse, &visit.id, Some("x".into()), None)
            .expect_err("nurses use the full-edit surface instead");
        assert!(matches!(err, ClinicError::Unauthorized { .. }));
    }

    #[test]
    fn review_sets_the_full_review_sub_state() {
        let clinic = TestClinic::new();
        let visit = clinic.create_visit();

        let reviewed = clinic
            .visits
            .review(&clinic.doctor, &visit.id, "approved, no action needed")
            .expect("review should succeed");

        assert!(reviewed.is_reviewed);
        assert_eq!(
            reviewed.doctor_comment.as_deref(),
            Some("approved, no action needed")
        );
        assert_eq!(reviewed.reviewed_by.as_ref(), Some(&clinic.doctor.id));
        assert!(reviewed.reviewed_at.is_some());
    }

    #[test]
    fn review_rejects_empty_comment() {
        let clinic = TestClinic::new();
        let visit = clinic.create_visit();

        let err = clinic
            .visits
            .review(&clinic.doctor, &visit.id, "   ")
            .expect_err("empty comment should be rejected");
        assert!(matches!(err, ClinicError::InvalidInput(_)));
    }

    #[test]
    fn review_is_doctor_only() {
        let clinic = TestClinic::new();
        let visit = clinic.create_visit();

        let err = clinic
            .visits
            .review(&clinic.nurse, &visit.id, "looks fine")
            .expect_err("nurses cannot review");
        assert!(matches!(err, ClinicError::Unauthorized { .. }));
    }

    #[test]
    fn second_review_overwrites_as_a_correction() {
        let clinic = TestClinic::new();
        let visit = clinic.create_visit();

        let first = clinic
            .visits
            .review(&clinic.doctor, &visit.id, "initial assessment")
            .expect("first review should succeed");
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = clinic
            .visits
            .review(&clinic.doctor, &visit.id, "corrected assessment")
            .expect("re-review should succeed");

        assert!(second.is_reviewed);
        assert_eq!(
            second.doctor_comment.as_deref(),
            Some("corrected assessment")
        );
        assert!(second.reviewed_at > first.reviewed_at);
    }

    #[test]
    fn follow_up_reports_are_append_only_and_ordered() {
        let clinic = TestClinic::new();
        let visit = clinic.create_visit();

        let after_first = clinic
            .visits
            .add_follow_up_report(&clinic.nurse, &visit.id, "temperature normal")
            .expect("first report should append");
        assert_eq!(after_first.follow_up_reports.len(), 1);
        assert!(after_first.is_follow_up_completed);

        let first_snapshot = after_first.follow_up_reports.clone();

        let after_second = clinic
            .visits
            .add_follow_up_report(&clinic.nurse, &visit.id, "back in class")
            .expect("second report should append");

        assert_eq!(after_second.follow_up_reports.len(), 2);
        assert_eq!(
            after_second.follow_up_reports[0], first_snapshot[0],
            "prior entries are unchanged by later appends"
        );
        assert_eq!(after_second.follow_up_reports[1].note, "back in class");
        assert_eq!(after_second.follow_up_reports[1].added_by, clinic.nurse.id);
    }

    #[test]
    fn follow_up_report_rejects_empty_note() {
        let clinic = TestClinic::new();
        let visit = clinic.create_visit();

        let err = clinic
            .visits
            .add_follow_up_report(&clinic.nurse, &visit.id, "")
            .expect_err("empty note should be rejected");
        assert!(matches!(err, ClinicError::InvalidInput(_)));
    }

    #[test]
    fn follow_up_report_is_nurse_only() {
        let clinic = TestClinic::new();
        let visit = clinic.create_visit();

        let err = clinic
            .visits
            .add_follow_up_report(&clinic.doctor, &visit.id, "note")
            .expect_err("doctors do not file follow-up reports under the strict policy");
        assert!(matches!(err, ClinicError::Unauthorized { .. }));
    }

    #[test]
    fn get_resolves_follow_up_report_authors() {
        let clinic = TestClinic::new();
        let visit = clinic.create_visit();
        clinic
            .visits
            .add_follow_up_report(&clinic.nurse, &visit.id, "checked again")
            .expect("report should append");

        let view = clinic
            .visits
            .get(&clinic.doctor, &visit.id)
            .expect("get should succeed");
        assert_eq!(view.follow_up_reports.len(), 1);
        assert_eq!(
            view.follow_up_reports[0].added_by_name.as_deref(),
            Some("Nurse Joy")
        );
    }

    #[test]
    fn mark_all_viewed_is_idempotent() {
        let clinic = TestClinic::new();
        clinic.create_visit();
        clinic.create_visit();

        assert_eq!(clinic.visits.count_unread(&clinic.admin).unwrap(), 2);

        let flipped = clinic
            .visits
            .mark_all_viewed(&clinic.admin)
            .expect("bulk mark should succeed");
        assert_eq!(flipped, 2);
        assert_eq!(clinic.visits.count_unread(&clinic.admin).unwrap(), 0);

        let again = clinic
            .visits
            .mark_all_viewed(&clinic.admin)
            .expect("second call should succeed");
        assert_eq!(again, 0, "second call is a no-op");
        assert_eq!(clinic.visits.count_unread(&clinic.admin).unwrap(), 0);
    }

    #[test]
    fn read_state_tracker_is_admin_only() {
        let clinic = TestClinic::new();
        clinic.create_visit();

        for caller in [&clinic.nurse, &clinic.doctor] {
            assert!(matches!(
                clinic.visits.count_unread(caller),
                Err(ClinicError::Unauthorized { .. })
            ));
            assert!(matches!(
                clinic.visits.mark_all_viewed(caller),
                Err(ClinicError::Unauthorized { .. })
            ));
        }
    }

    #[test]
    fn full_review_scenario() {
        let clinic = TestClinic::new();
        let visit = clinic.create_visit();

        let before = clinic
            .visits
            .get(&clinic.doctor, &visit.id)
            .expect("get should succeed");
        assert!(!before.visit.is_reviewed);

        clinic
            .visits
            .review(&clinic.doctor, &visit.id, "approved, no action needed")
            .expect("review should succeed");

        let after = clinic
            .visits
            .get(&clinic.nurse, &visit.id)
            .expect("get should succeed");
        assert!(after.visit.is_reviewed);
        assert_eq!(
            after.visit.doctor_comment.as_deref(),
            Some("approved, no action needed")
        );
        assert_eq!(after.visit.reviewed_by.as_ref(), Some(&clinic.doctor.id));
        assert_eq!(after.reviewed_by_name.as_deref(), Some("Dr Bassey"));
    }

    #[test]
    fn visit_survives_student_deletion_with_unresolved_reference() {
        let clinic = TestClinic::new();
        let visit = clinic.create_visit();

        clinic
            .students
            .delete(&clinic.admin, &clinic.student_id)
            .expect("student deletion should succeed");

        let view = clinic
            .visits
            .get(&clinic.admin, &visit.id)
            .expect("visit remains a permanent record");
        assert!(view.student.is_none(), "reference no longer resolves");
        assert_eq!(view.visit.student_id, clinic.student_id);
    }
}
