mod outcome;
mod prerequisites;

pub use outcome::{DropReceipt, EnrollmentError, EnrollmentReceipt, FailureKind};
pub use prerequisites::{has_completed_prerequisites, missing_prerequisites};

pub(crate) use outcome::store_kind;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use super::domain::{Course, CourseCode, Student, UserId};
use super::repository::{CourseCatalog, StoreError, UserDirectory};
use super::schedule;

/// Which checks an enrollment has to pass after the existence and duplicate checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    /// Capacity, schedule conflict, then prerequisites.
    Standard,
    /// Approved special request: none of the soft constraints apply.
    StaffOverride,
}

/// Evaluates and executes enroll/drop decisions against the catalog and directory.
///
/// Every mutating call holds `write_lock` from the first read to the last write, so the
/// capacity check and seat allocation happen as one unit even with concurrent callers.
pub struct EnrollmentEngine<C, D> {
    catalog: Arc<C>,
    directory: Arc<D>,
    write_lock: Mutex<()>,
}

impl<C, D> EnrollmentEngine<C, D>
where
    C: CourseCatalog + 'static,
    D: UserDirectory + 'static,
{
    pub fn new(catalog: Arc<C>, directory: Arc<D>) -> Self {
        Self {
            catalog,
            directory,
            write_lock: Mutex::new(()),
        }
    }

    pub fn catalog(&self) -> &Arc<C> {
        &self.catalog
    }

    pub fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    /// Enroll a student, applying the full rule set.
    pub fn enroll(
        &self,
        student_id: &UserId,
        course_code: &CourseCode,
    ) -> Result<EnrollmentReceipt, EnrollmentError> {
        let _guard = self.write_guard()?;
        let outcome = self.admit(student_id, course_code, Admission::Standard);
        log_enrollment(student_id, course_code, &outcome);
        outcome
    }

    /// Enroll on behalf of an approved special request. Only existence and duplicate
    /// registration are checked.
    pub fn enroll_bypassing_capacity(
        &self,
        student_id: &UserId,
        course_code: &CourseCode,
    ) -> Result<EnrollmentReceipt, EnrollmentError> {
        let _guard = self.write_guard()?;
        let outcome = self.admit(student_id, course_code, Admission::StaffOverride);
        log_enrollment(student_id, course_code, &outcome);
        outcome
    }

    pub fn drop_course(
        &self,
        student_id: &UserId,
        course_code: &CourseCode,
    ) -> Result<DropReceipt, EnrollmentError> {
        let _guard = self.write_guard()?;
        let outcome = self.release(student_id, course_code);
        match &outcome {
            Ok(_) => info!(student = %student_id, course = %course_code, "course dropped"),
            Err(error) => info!(
                student = %student_id,
                course = %course_code,
                kind = error.kind().label(),
                "drop rejected"
            ),
        }
        outcome
    }

    pub fn has_schedule_conflict(
        &self,
        student: &Student,
        course: &Course,
    ) -> Result<bool, StoreError> {
        Ok(self.conflicting_course(student, course)?.is_some())
    }

    /// First registered course whose meeting time overlaps `course`. Registered codes
    /// missing from the catalog are skipped.
    pub fn conflicting_course(
        &self,
        student: &Student,
        course: &Course,
    ) -> Result<Option<CourseCode>, StoreError> {
        for code in &student.registered {
            let Some(registered) = self.catalog.fetch(code)? else {
                continue;
            };
            if schedule::schedules_overlap(&course.schedule, &registered.schedule) {
                return Ok(Some(registered.code));
            }
        }
        Ok(None)
    }

    pub fn schedules_overlap(&self, first: &str, second: &str) -> bool {
        schedule::schedules_overlap(first, second)
    }

    pub fn has_completed_prerequisites(&self, student: &Student, course: &Course) -> bool {
        has_completed_prerequisites(student, course)
    }

    /// Transitive prerequisites of `course_code`. `visited` belongs to the caller's
    /// walk; codes already in it contribute nothing.
    pub fn list_all_prerequisites(
        &self,
        course_code: &CourseCode,
        visited: &mut HashSet<CourseCode>,
    ) -> Result<Vec<CourseCode>, StoreError> {
        prerequisites::expand(self.catalog.as_ref(), course_code, visited)
    }

    pub fn prerequisite_closure(
        &self,
        course_code: &CourseCode,
    ) -> Result<Vec<CourseCode>, StoreError> {
        let mut visited = HashSet::new();
        self.list_all_prerequisites(course_code, &mut visited)
    }

    /// Registered courses in registration order; unknown students have none.
    pub fn student_courses(&self, student_id: &UserId) -> Result<Vec<Course>, StoreError> {
        let Some(student) = self.directory.student(student_id)? else {
            return Ok(Vec::new());
        };

        let mut courses = Vec::with_capacity(student.registered.len());
        for code in &student.registered {
            if let Some(course) = self.catalog.fetch(code)? {
                courses.push(course);
            }
        }
        Ok(courses)
    }

    pub fn available_courses(&self) -> Result<Vec<Course>, StoreError> {
        self.catalog.available()
    }

    pub fn student(&self, student_id: &UserId) -> Result<Option<Student>, StoreError> {
        self.directory.student(student_id)
    }

    pub fn course(&self, course_code: &CourseCode) -> Result<Option<Course>, StoreError> {
        self.catalog.fetch(course_code)
    }

    /// Replace a course's catalog details. Enrollment is owned by the engine, so the
    /// stored `enrolled` set wins over whatever the caller passes in.
    pub fn update_course(&self, mut course: Course) -> Result<Course, EnrollmentError> {
        let _guard = self.write_guard()?;
        let stored = self
            .catalog
            .fetch(&course.code)?
            .ok_or_else(|| EnrollmentError::CourseNotFound(course.code.clone()))?;

        if (course.capacity as usize) < stored.enrolled_count() {
            return Err(EnrollmentError::CapacityBelowEnrollment {
                course_code: course.code,
                capacity: course.capacity,
                enrolled: stored.enrolled_count(),
            });
        }

        course.enrolled = stored.enrolled;
        self.catalog.update(course.clone())?;
        info!(course = %course.code, capacity = course.capacity, "course updated");
        Ok(course)
    }

    /// Remove a course and unregister every enrolled student from it.
    pub fn remove_course(&self, course_code: &CourseCode) -> Result<bool, StoreError> {
        let _guard = self.write_guard()?;
        let Some(course) = self.catalog.fetch(course_code)? else {
            return Ok(false);
        };

        for student_id in &course.enrolled {
            let Some(mut student) = self.directory.student(student_id)? else {
                continue;
            };
            if student.unregister(course_code) {
                self.directory.update_student(student)?;
            }
        }

        let removed = self.catalog.remove(course_code)?;
        info!(
            course = %course_code,
            released = course.enrolled_count(),
            "course removed"
        );
        Ok(removed)
    }

    fn write_guard(&self) -> Result<MutexGuard<'_, ()>, StoreError> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("enrollment lock poisoned".to_string()))
    }

    fn admit(
        &self,
        student_id: &UserId,
        course_code: &CourseCode,
        admission: Admission,
    ) -> Result<EnrollmentReceipt, EnrollmentError> {
        let mut student = self
            .directory
            .student(student_id)?
            .ok_or_else(|| EnrollmentError::StudentNotFound(student_id.clone()))?;
        let mut course = self
            .catalog
            .fetch(course_code)?
            .ok_or_else(|| EnrollmentError::CourseNotFound(course_code.clone()))?;

        if student.is_registered(course_code) {
            return Err(EnrollmentError::AlreadyRegistered {
                student_id: student_id.clone(),
                course_code: course_code.clone(),
            });
        }

        match admission {
            Admission::Standard => self.check_rules(&student, &course)?,
            Admission::StaffOverride => {}
        }

        let original = student.clone();
        student.register(course.code.clone());
        course.enrolled.insert(student.id.clone());

        let receipt = EnrollmentReceipt {
            student_id: student.id.clone(),
            course_code: course.code.clone(),
            course_title: course.title.clone(),
            seats_remaining: course.seats_remaining(),
            capacity_bypassed: admission == Admission::StaffOverride,
        };

        self.persist(student, course, original)?;
        Ok(receipt)
    }

    fn check_rules(&self, student: &Student, course: &Course) -> Result<(), EnrollmentError> {
        if !course.has_free_seat() {
            return Err(EnrollmentError::CourseFull {
                course_code: course.code.clone(),
                capacity: course.capacity,
            });
        }

        if let Some(conflicting) = self.conflicting_course(student, course)? {
            return Err(EnrollmentError::ScheduleConflict {
                course_code: course.code.clone(),
                conflicting,
            });
        }

        let missing = missing_prerequisites(student, course);
        if !missing.is_empty() {
            return Err(EnrollmentError::PrerequisitesNotMet {
                course_code: course.code.clone(),
                missing,
            });
        }

        Ok(())
    }

    fn release(
        &self,
        student_id: &UserId,
        course_code: &CourseCode,
    ) -> Result<DropReceipt, EnrollmentError> {
        let mut student = self
            .directory
            .student(student_id)?
            .ok_or_else(|| EnrollmentError::StudentNotFound(student_id.clone()))?;
        let mut course = self
            .catalog
            .fetch(course_code)?
            .ok_or_else(|| EnrollmentError::CourseNotFound(course_code.clone()))?;

        let original = student.clone();
        if !student.unregister(course_code) {
            return Err(EnrollmentError::NotRegistered {
                student_id: student_id.clone(),
                course_code: course_code.clone(),
            });
        }
        course.enrolled.remove(student_id);

        let receipt = DropReceipt {
            student_id: student.id.clone(),
            course_code: course.code.clone(),
            course_title: course.title.clone(),
        };

        self.persist(student, course, original)?;
        Ok(receipt)
    }

    /// Write both sides of the membership. If the course write fails the student
    /// record is restored so the two sides stay consistent.
    fn persist(
        &self,
        student: Student,
        course: Course,
        original: Student,
    ) -> Result<(), StoreError> {
        self.directory.update_student(student)?;
        if let Err(error) = self.catalog.update(course) {
            if let Err(rollback) = self.directory.update_student(original) {
                warn!(%rollback, "failed to restore student after catalog write error");
            }
            return Err(error);
        }
        Ok(())
    }
}

fn log_enrollment(
    student_id: &UserId,
    course_code: &CourseCode,
    outcome: &Result<EnrollmentReceipt, EnrollmentError>,
) {
    match outcome {
        Ok(receipt) => info!(
            student = %student_id,
            course = %course_code,
            seats_remaining = receipt.seats_remaining,
            capacity_bypassed = receipt.capacity_bypassed,
            "student enrolled"
        ),
        Err(error) => info!(
            student = %student_id,
            course = %course_code,
            kind = error.kind().label(),
            "enrollment rejected"
        ),
    }
}
