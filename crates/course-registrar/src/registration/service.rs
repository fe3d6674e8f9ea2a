use std::sync::Arc;

use tracing::info;

use super::domain::{
    Course, CourseCode, RequestId, Review, Role, SpecialRegistrationRequest, StaffMember,
    Student, User, UserId,
};
use super::enrollment::{DropReceipt, EnrollmentEngine, EnrollmentError, EnrollmentReceipt};
use super::repository::{CourseCatalog, StoreError, UserDirectory};
use super::requests::{RequestDecision, RequestError, RequestIdFormat, RequestWorkflow};
use super::snapshot::RegistrarSnapshot;

/// Service composing the catalog, directory, enrollment engine, and request workflow.
pub struct RegistrationService<C, D> {
    engine: EnrollmentEngine<C, D>,
    workflow: RequestWorkflow,
}

impl<C, D> RegistrationService<C, D>
where
    C: CourseCatalog + 'static,
    D: UserDirectory + 'static,
{
    pub fn new(catalog: Arc<C>, directory: Arc<D>, format: RequestIdFormat) -> Self {
        Self {
            engine: EnrollmentEngine::new(catalog, directory),
            workflow: RequestWorkflow::new(format),
        }
    }

    pub fn engine(&self) -> &EnrollmentEngine<C, D> {
        &self.engine
    }

    pub fn workflow(&self) -> &RequestWorkflow {
        &self.workflow
    }

    pub fn enroll(
        &self,
        student_id: &UserId,
        course_code: &CourseCode,
    ) -> Result<EnrollmentReceipt, EnrollmentError> {
        self.engine.enroll(student_id, course_code)
    }

    pub fn drop_course(
        &self,
        student_id: &UserId,
        course_code: &CourseCode,
    ) -> Result<DropReceipt, EnrollmentError> {
        self.engine.drop_course(student_id, course_code)
    }

    pub fn student_courses(&self, student_id: &UserId) -> Result<Vec<Course>, StoreError> {
        self.engine.student_courses(student_id)
    }

    pub fn prerequisite_closure(
        &self,
        course_code: &CourseCode,
    ) -> Result<Vec<CourseCode>, StoreError> {
        self.engine.prerequisite_closure(course_code)
    }

    pub fn submit_request(
        &self,
        student_id: &UserId,
        course_code: &CourseCode,
    ) -> Result<SpecialRegistrationRequest, RequestError> {
        self.workflow.submit(&self.engine, student_id, course_code)
    }

    pub fn approve_request(
        &self,
        request_id: &RequestId,
        review: Review,
    ) -> Result<RequestDecision, RequestError> {
        self.authorize_reviewer(&review)?;
        self.workflow.approve(&self.engine, request_id, review)
    }

    pub fn deny_request(
        &self,
        request_id: &RequestId,
        review: Review,
    ) -> Result<RequestDecision, RequestError> {
        self.authorize_reviewer(&review)?;
        self.workflow.deny(request_id, review)
    }

    pub fn request(
        &self,
        request_id: &RequestId,
    ) -> Result<Option<SpecialRegistrationRequest>, StoreError> {
        self.workflow.request(request_id)
    }

    pub fn pending_requests(&self) -> Result<Vec<SpecialRegistrationRequest>, StoreError> {
        self.workflow.list_pending()
    }

    pub fn requests_for_student(
        &self,
        student_id: &UserId,
    ) -> Result<Vec<SpecialRegistrationRequest>, StoreError> {
        self.workflow.list_by_student(student_id)
    }

    pub fn all_requests(&self) -> Result<Vec<SpecialRegistrationRequest>, StoreError> {
        self.workflow.list_all()
    }

    pub fn course(&self, course_code: &CourseCode) -> Result<Option<Course>, StoreError> {
        self.engine.course(course_code)
    }

    pub fn courses(&self) -> Result<Vec<Course>, StoreError> {
        self.engine.catalog().list()
    }

    pub fn available_courses(&self) -> Result<Vec<Course>, StoreError> {
        self.engine.available_courses()
    }

    pub fn add_course(&self, course: Course) -> Result<Course, StoreError> {
        self.engine.catalog().insert(course)
    }

    /// Enrolled students are kept; a capacity below the current enrollment is rejected.
    pub fn update_course(&self, course: Course) -> Result<Course, EnrollmentError> {
        self.engine.update_course(course)
    }

    pub fn remove_course(&self, course_code: &CourseCode) -> Result<bool, StoreError> {
        self.engine.remove_course(course_code)
    }

    pub fn add_user(&self, user: User) -> Result<User, StoreError> {
        self.engine.directory().insert(user)
    }

    pub fn remove_user(&self, user_id: &UserId, role: Role) -> Result<bool, StoreError> {
        self.engine.directory().remove(user_id, role)
    }

    pub fn authenticate(
        &self,
        user_id: &UserId,
        credential: &str,
    ) -> Result<Option<User>, StoreError> {
        self.engine.directory().authenticate(user_id, credential)
    }

    pub fn student(&self, student_id: &UserId) -> Result<Option<Student>, StoreError> {
        self.engine.student(student_id)
    }

    pub fn students(&self) -> Result<Vec<Student>, StoreError> {
        self.engine.directory().students()
    }

    pub fn advisors(&self) -> Result<Vec<StaffMember>, StoreError> {
        self.engine.directory().advisors()
    }

    pub fn administrators(&self) -> Result<Vec<StaffMember>, StoreError> {
        self.engine.directory().administrators()
    }

    pub fn snapshot(&self) -> Result<RegistrarSnapshot, StoreError> {
        let directory = self.engine.directory();
        Ok(RegistrarSnapshot {
            courses: self.engine.catalog().list()?,
            students: directory.students()?,
            advisors: directory.advisors()?,
            administrators: directory.administrators()?,
            requests: self.workflow.list_all()?,
        })
    }

    /// Replace all state with the snapshot contents; request numbering resumes after
    /// the highest restored id.
    pub fn restore(&self, snapshot: RegistrarSnapshot) -> Result<(), StoreError> {
        let RegistrarSnapshot {
            courses,
            students,
            advisors,
            administrators,
            requests,
        } = snapshot;

        info!(
            courses = courses.len(),
            students = students.len(),
            requests = requests.len(),
            "restoring registrar snapshot"
        );

        self.engine.catalog().replace_all(courses)?;
        self.engine
            .directory()
            .replace_all(students, advisors, administrators)?;
        self.workflow.replace_all(requests)
    }

    /// Anonymous reviews are accepted; a named reviewer must hold a staff role that
    /// can review requests.
    fn authorize_reviewer(&self, review: &Review) -> Result<(), RequestError> {
        let Some(reviewer) = &review.reviewer else {
            return Ok(());
        };

        let directory = self.engine.directory();
        let role = if directory.advisor(reviewer)?.is_some() {
            Some(Role::Advisor)
        } else if directory.administrator(reviewer)?.is_some() {
            Some(Role::Administrator)
        } else {
            None
        };

        match role {
            Some(role) if role.capabilities().can_review_requests => Ok(()),
            _ => Err(RequestError::ReviewerNotAuthorized(reviewer.clone())),
        }
    }
}
