//! Admin dashboard aggregates.

use crate::caller::{Caller, Role};
use crate::error::ClinicResult;
use crate::policy::{authorise, Action};
use crate::staff::StaffService;
use crate::students::StudentService;
use crate::visits::VisitService;
use serde::Serialize;

/// Headline counts for the admin landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: usize,
    pub total_visits: usize,
    pub total_nurses: usize,
    pub boarders: usize,
    pub day_students: usize,
}

/// Read-only aggregation over the other services.
#[derive(Clone)]
pub struct DashboardService {
    students: StudentService,
    staff: StaffService,
    visits: VisitService,
}

impl DashboardService {
    pub fn new(students: StudentService, staff: StaffService, visits: VisitService) -> Self {
        Self {
            students,
            staff,
            visits,
        }
    }

    /// Computes the dashboard counts. Admin only.
    ///
    /// Counts are computed per request from the stored records; nothing is
    /// cached or incrementally maintained.
    pub fn stats(&self, caller: &Caller) -> ClinicResult<DashboardStats> {
        authorise(caller, Action::ViewDashboard)?;

        let (total_students, boarders, day_students) = self.students.counts();

        Ok(DashboardStats {
            total_students,
            total_visits: self.visits.count_all(),
            total_nurses: self.staff.count_role(Role::Nurse),
            boarders,
            day_students,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::error::ClinicError;
    use crate::staff::NewStaff;
    use crate::students::{NewStudent, StudentType};
    use crate::uuid::RecordUuid;
    use sickbay_types::{EmailAddress, NonEmptyText};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn seed_student(
        students: &StudentService,
        admin: &Caller,
        admission_no: &str,
        student_type: StudentType,
    ) -> RecordUuid {
        students
            .create(
                admin,
                NewStudent {
                    full_name: NonEmptyText::new("Ada Obi").unwrap(),
                    admission_no: NonEmptyText::new(admission_no).unwrap(),
                    class_name: NonEmptyText::new("JSS2").unwrap(),
                    student_type,
                    blood_group: None,
                    genotype: None,
                    allergies: None,
                    chronic_condition: None,
                    parent_phone: NonEmptyText::new("08030000000").unwrap(),
                },
            )
            .expect("seeding student should succeed")
            .id
    }

    #[test]
    fn stats_count_students_visits_and_nurses() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = Arc::new(
            CoreConfig::new(temp_dir.path().to_path_buf()).expect("CoreConfig::new should succeed"),
        );
        let staff = StaffService::new(cfg.clone());
        let students = StudentService::new(cfg.clone());
        let visits = VisitService::new(
            cfg,
            Arc::new(students.clone()),
            Arc::new(staff.clone()),
        );
        let dashboard = DashboardService::new(students.clone(), staff.clone(), visits.clone());

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
        seed_staff("Nurse Ben", "nurse2@school.ng", Role::Nurse);
        seed_staff("Dr Bassey", "doctor@school.ng", Role::Doctor);

        let boarder = seed_student(&students, &admin, "ADM-001", StudentType::Boarder);
        seed_student(&students, &admin, "ADM-002", StudentType::Day);
        seed_student(&students, &admin, "ADM-003", StudentType::Day);

        visits
            .create(
                &nurse,
                crate::visits::NewVisit {
                    student_id: boarder,
                    symptoms: NonEmptyText::new("fever").unwrap(),
                    diagnosis: NonEmptyText::new("flu").unwrap(),
                    treatment: NonEmptyText::new("rest").unwrap(),
                    drugs: None,
                    outcome: crate::visits::Outcome::ReturnedToClass,
                    temperature: None,
                    spo2: None,
                    pulse: None,
                    weight: None,
                    follow_up_required: false,
                    follow_up_date: None,
                    follow_up_note: None,
                },
            )
            .expect("visit creation should succeed");

        let stats = dashboard.stats(&admin).expect("admin can view stats");
        assert_eq!(
            stats,
            DashboardStats {
                total_students: 3,
                total_visits: 1,
                total_nurses: 2,
                boarders: 1,
                day_students: 2,
            }
        );

        // Non-admins are refused.
        let err = dashboard
            .stats(&nurse)
            .expect_err("dashboard is admin only");
        assert!(matches!(err, ClinicError::Unauthorized { .. }));
    }

    #[test]
    fn stats_are_all_zero_on_an_empty_clinic() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = Arc::new(
            CoreConfig::new(temp_dir.path().to_path_buf()).expect("CoreConfig::new should succeed"),
        );
        let staff = StaffService::new(cfg.clone());
        let students = StudentService::new(cfg.clone());
        let visits = VisitService::new(
            cfg,
            Arc::new(students.clone()),
            Arc::new(staff.clone()),
        );
        let dashboard = DashboardService::new(students, staff.clone(), visits);

        let profile = staff
            .create_account(NewStaff {
                full_name: NonEmptyText::new("Ada Admin").unwrap(),
                email: EmailAddress::parse("admin@school.ng").unwrap(),
                password: NonEmptyText::new("secret").unwrap(),
                role: Role::Admin,
            })
            .expect("seeding admin should succeed");
        let admin = Caller {
            id: profile.id,
            role: Role::Admin,
            full_name: profile.full_name,
        };

        let stats = dashboard.stats(&admin).expect("stats should succeed");
        assert_eq!(stats.total_students, 0);
        assert_eq!(stats.total_visits, 0);
        // The admin account itself is not a nurse.
        assert_eq!(stats.total_nurses, 0);
    }
}
