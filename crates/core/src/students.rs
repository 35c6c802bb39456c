//! Student directory.
//!
//! Owns student demographic and medical-alert records. Visits reference
//! students by identifier only; the visit engine consumes this module through
//! the [`StudentDirectory`] trait so reference checks and display-time
//! resolution stay explicit and injectable.
//!
//! Unlike visits, student records support the full CRUD set including delete.

use crate::caller::Caller;
use crate::config::CoreConfig;
use crate::constants::STUDENT_JSON_FILENAME;
use crate::error::{ClinicError, ClinicResult};
use crate::policy::{authorise, Action};
use crate::store;
use crate::uuid::RecordUuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sickbay_types::NonEmptyText;
use std::fmt;
use std::sync::Arc;

/// Whether a student boards at the school or attends daily.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudentType {
    Boarder,
    Day,
}

impl fmt::Display for StudentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudentType::Boarder => write!(f, "Boarder"),
            StudentType::Day => write!(f, "Day"),
        }
    }
}

impl std::str::FromStr for StudentType {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Boarder" => Ok(StudentType::Boarder),
            "Day" => Ok(StudentType::Day),
            other => Err(ClinicError::InvalidInput(format!(
                "student type must be 'Boarder' or 'Day', got: '{other}'"
            ))),
        }
    }
}

/// A student record as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: RecordUuid,
    pub full_name: String,
    pub admission_no: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub student_type: StudentType,
    #[serde(default)]
    pub blood_group: Option<String>,
    #[serde(default)]
    pub genotype: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub chronic_condition: Option<String>,
    pub parent_phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a student. Required fields are validated at the type
/// level; the optional medical-alert fields stay plain strings.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub full_name: NonEmptyText,
    pub admission_no: NonEmptyText,
    pub class_name: NonEmptyText,
    pub student_type: StudentType,
    pub blood_group: Option<String>,
    pub genotype: Option<String>,
    pub allergies: Option<String>,
    pub chronic_condition: Option<String>,
    pub parent_phone: NonEmptyText,
}

/// Partial update for a student.
///
/// Every field uses "provided-and-non-empty overrides, omitted leaves
/// unchanged" semantics, mirroring the truthy-override behaviour of the
/// original update surface.
#[derive(Debug, Clone, Default)]
pub struct StudentUpdate {
    pub full_name: Option<String>,
    pub admission_no: Option<String>,
    pub class_name: Option<String>,
    pub student_type: Option<StudentType>,
    pub blood_group: Option<String>,
    pub genotype: Option<String>,
    pub allergies: Option<String>,
    pub chronic_condition: Option<String>,
    pub parent_phone: Option<String>,
}

/// Display projection of a student, resolved at the read boundary of the
/// visit engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub full_name: String,
    pub admission_no: String,
    #[serde(rename = "class")]
    pub class_name: String,
}

/// Reference-resolution capability consumed by the visit engine.
///
/// The visit engine never reads student documents directly; it checks
/// references and resolves display projections through this trait.
pub trait StudentDirectory: Send + Sync {
    /// Returns whether a student with this id exists.
    fn exists(&self, id: &RecordUuid) -> ClinicResult<bool>;

    /// Returns the display projection for a student, or `None` if the id does
    /// not resolve.
    fn summary(&self, id: &RecordUuid) -> ClinicResult<Option<StudentSummary>>;
}

/// Service owning student CRUD.
#[derive(Clone)]
pub struct StudentService {
    cfg: Arc<CoreConfig>,
}

impl StudentService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    fn read(&self, id: &RecordUuid) -> ClinicResult<Student> {
        let path = store::document_path(&self.cfg.students_dir(), id, STUDENT_JSON_FILENAME);
        if !path.is_file() {
            return Err(ClinicError::NotFound("student"));
        }
        store::read_json(&path)
    }

    fn write(&self, student: &Student) -> ClinicResult<()> {
        let path =
            store::document_path(&self.cfg.students_dir(), &student.id, STUDENT_JSON_FILENAME);
        store::write_json_atomic(&path, student)
    }

    /// Creates a student record. Admin only.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::DuplicateAdmissionNo`] if another student
    /// already holds the admission number.
    pub fn create(&self, caller: &Caller, new: NewStudent) -> ClinicResult<Student> {
        authorise(caller, Action::CreateStudent)?;

        let admission_no = new.admission_no.as_str();
        let existing: Vec<Student> = store::read_all(&self.cfg.students_dir(), STUDENT_JSON_FILENAME);
        if existing.iter().any(|s| s.admission_no == admission_no) {
            return Err(ClinicError::DuplicateAdmissionNo(admission_no.to_owned()));
        }

        let (id, dir) = store::create_record_dir(&self.cfg.students_dir(), RecordUuid::new)?;
        let now = Utc::now();

        let student = Student {
            id,
            full_name: new.full_name.into_inner(),
            admission_no: new.admission_no.into_inner(),
            class_name: new.class_name.into_inner(),
            student_type: new.student_type,
            blood_group: new.blood_group,
            genotype: new.genotype,
            allergies: new.allergies,
            chronic_condition: new.chronic_condition,
            parent_phone: new.parent_phone.into_inner(),
            created_at: now,
            updated_at: now,
        };

        store::write_json_atomic(&dir.join(STUDENT_JSON_FILENAME), &student)?;
        tracing::info!(student = %student.id, "student record created");

        Ok(student)
    }

    /// Lists all students. Any authenticated role.
    pub fn list(&self, caller: &Caller) -> ClinicResult<Vec<Student>> {
        authorise(caller, Action::ListStudents)?;

        let mut students: Vec<Student> =
            store::read_all(&self.cfg.students_dir(), STUDENT_JSON_FILENAME);
        students.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(students)
    }

    /// Returns one student. Any authenticated role.
    pub fn get(&self, caller: &Caller, id: &RecordUuid) -> ClinicResult<Student> {
        authorise(caller, Action::GetStudent)?;
        self.read(id)
    }

    /// Applies a partial update. Admin only.
    ///
    /// Empty strings are treated as "not provided" (truthy-override), so a
    /// blank form field never wipes an existing value.
    pub fn update(
        &self,
        caller: &Caller,
        id: &RecordUuid,
        update: StudentUpdate,
    ) -> ClinicResult<Student> {
        authorise(caller, Action::UpdateStudent)?;

        let mut student = self.read(id)?;

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

        override_text(&mut student.full_name, update.full_name);
        override_text(&mut student.admission_no, update.admission_no);
        override_text(&mut student.class_name, update.class_name);
        if let Some(student_type) = update.student_type {
            student.student_type = student_type;
        }
        override_optional_text(&mut student.blood_group, update.blood_group);
        override_optional_text(&mut student.genotype, update.genotype);
        override_optional_text(&mut student.allergies, update.allergies);
        override_optional_text(&mut student.chronic_condition, update.chronic_condition);
        override_text(&mut student.parent_phone, update.parent_phone);

        student.updated_at = Utc::now();
        self.write(&student)?;

        Ok(student)
    }

    /// Deletes a student record. Admin only.
    pub fn delete(&self, caller: &Caller, id: &RecordUuid) -> ClinicResult<()> {
        authorise(caller, Action::DeleteStudent)?;

        if !store::remove_record_dir(&self.cfg.students_dir(), id)? {
            return Err(ClinicError::NotFound("student"));
        }
        tracing::info!(student = %id, "student record deleted");
        Ok(())
    }

    /// Total number of students, with the boarder/day split. Used by the
    /// dashboard.
    pub(crate) fn counts(&self) -> (usize, usize, usize) {
        let students: Vec<Student> =
            store::read_all(&self.cfg.students_dir(), STUDENT_JSON_FILENAME);
        let boarders = students
            .iter()
            .filter(|s| s.student_type == StudentType::Boarder)
            .count();
        let day = students.len() - boarders;
        (students.len(), boarders, day)
    }
}

impl StudentDirectory for StudentService {
    fn exists(&self, id: &RecordUuid) -> ClinicResult<bool> {
        let path = store::document_path(&self.cfg.students_dir(), id, STUDENT_JSON_FILENAME);
        Ok(path.is_file())
    }

    fn summary(&self, id: &RecordUuid) -> ClinicResult<Option<StudentSummary>> {
        match self.read(id) {
            Ok(student) => Ok(Some(StudentSummary {
                full_name: student.full_name,
                admission_no: student.admission_no,
                class_name: student.class_name,
            })),
            Err(ClinicError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caller::Role;
    use std::path::Path;
    use tempfile::TempDir;

    fn test_cfg(data_dir: &Path) -> Arc<CoreConfig> {
        Arc::new(CoreConfig::new(data_dir.to_path_buf()).expect("CoreConfig::new should succeed"))
    }

    fn caller(role: Role) -> Caller {
        Caller {
            id: RecordUuid::new(),
            role,
            full_name: format!("Test {role}"),
        }
    }

    fn new_student(admission_no: &str) -> NewStudent {
        NewStudent {
            full_name: NonEmptyText::new("Ada Obi").unwrap(),
            admission_no: NonEmptyText::new(admission_no).unwrap(),
            class_name: NonEmptyText::new("JSS2").unwrap(),
            student_type: StudentType::Boarder,
            blood_group: Some("O+".into()),
            genotype: None,
            allergies: None,
            chronic_condition: None,
            parent_phone: NonEmptyText::new("08030000000").unwrap(),
        }
    }

    #[test]
    fn create_then_get_round_trips() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = StudentService::new(test_cfg(temp_dir.path()));
        let admin = caller(Role::Admin);

        let created = service
            .create(&admin, new_student("ADM-001"))
            .expect("create should succeed");

        let fetched = service
            .get(&caller(Role::Nurse), &created.id)
            .expect("get should succeed");
        assert_eq!(fetched, created);
    }

    #[test]
    fn create_rejects_duplicate_admission_no() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = StudentService::new(test_cfg(temp_dir.path()));
        let admin = caller(Role::Admin);

        service
            .create(&admin, new_student("ADM-001"))
            .expect("first create should succeed");

        let err = service
            .create(&admin, new_student("ADM-001"))
            .expect_err("duplicate admission number should be rejected");
        assert!(matches!(err, ClinicError::DuplicateAdmissionNo(no) if no == "ADM-001"));
    }

    #[test]
    fn create_requires_admin_role() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = StudentService::new(test_cfg(temp_dir.path()));

        let err = service
            .create(&caller(Role::Nurse), new_student("ADM-001"))
            .expect_err("nurse should not create students");
        assert!(matches!(err, ClinicError::Unauthorized { .. }));
    }

    #[test]
    fn update_ignores_empty_strings() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = StudentService::new(test_cfg(temp_dir.path()));
        let admin = caller(Role::Admin);

        let created = service
            .create(&admin, new_student("ADM-001"))
            .expect("create should succeed");

        let updated = service
            .update(
                &admin,
                &created.id,
                StudentUpdate {
                    full_name: Some(String::new()),
                    class_name: Some("JSS3".into()),
                    ..StudentUpdate::default()
                },
            )
            .expect("update should succeed");

        assert_eq!(updated.full_name, "Ada Obi", "blank field should be ignored");
        assert_eq!(updated.class_name, "JSS3");
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn delete_removes_record_and_reference_checks_follow() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = StudentService::new(test_cfg(temp_dir.path()));
        let admin = caller(Role::Admin);

        let created = service
            .create(&admin, new_student("ADM-001"))
            .expect("create should succeed");
        assert!(service.exists(&created.id).unwrap());

        service
            .delete(&admin, &created.id)
            .expect("delete should succeed");

        assert!(!service.exists(&created.id).unwrap());
        assert!(service.summary(&created.id).unwrap().is_none());
        let err = service
            .get(&admin, &created.id)
            .expect_err("deleted student should not resolve");
        assert!(matches!(err, ClinicError::NotFound("student")));
    }

    #[test]
    fn summary_projects_display_fields() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = StudentService::new(test_cfg(temp_dir.path()));

        let created = service
            .create(&caller(Role::Admin), new_student("ADM-042"))
            .expect("create should succeed");

        let summary = service
            .summary(&created.id)
            .expect("summary should succeed")
            .expect("student should resolve");
        assert_eq!(
            summary,
            StudentSummary {
                full_name: "Ada Obi".into(),
                admission_no: "ADM-042".into(),
                class_name: "JSS2".into(),
            }
        );
    }

    #[test]
    fn counts_split_boarders_and_day_students() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let service = StudentService::new(test_cfg(temp_dir.path()));
        let admin = caller(Role::Admin);

        service.create(&admin, new_student("ADM-001")).unwrap();
        let mut day = new_student("ADM-002");
        day.student_type = StudentType::Day;
        service.create(&admin, day).unwrap();

        assert_eq!(service.counts(), (2, 1, 1));
    }
}
