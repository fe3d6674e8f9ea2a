use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::registration::domain::{Course, CourseCode, StaffMember, Student, User, UserId};
use crate::registration::repository::{
    CourseCatalog, InMemoryCourseCatalog, InMemoryUserDirectory, StoreError,
};
use crate::registration::requests::RequestIdFormat;
use crate::registration::service::RegistrationService;
use crate::registration::{registration_router, EnrollmentEngine};

pub(super) type MemoryService = RegistrationService<InMemoryCourseCatalog, InMemoryUserDirectory>;

pub(super) fn courses() -> Vec<Course> {
    vec![
        Course::new("CS101", "Intro to Programming", "MW 10:00-11:30", 2),
        Course::new("CS201", "Data Structures", "TR 13:00-14:30", 2).with_prerequisites(["CS101"]),
        Course::new("CS301", "Algorithms", "MWF 11:00-12:00", 1).with_prerequisites(["CS201"]),
        Course::new("MATH150", "Calculus I", "TF 09:00-10:00", 1),
        Course::new("ART100", "Figure Drawing", "MW 10:30-12:00", 5),
    ]
}

pub(super) fn users() -> Vec<User> {
    vec![
        User::Student(Student::new("s-ada", "Ada Lovelace", "engine").with_completed(["CS101"])),
        User::Student(Student::new("s-alan", "Alan Turing", "enigma")),
        User::Student(
            Student::new("s-grace", "Grace Hopper", "cobol").with_completed(["CS101", "CS201"]),
        ),
        User::Advisor(StaffMember::new("adv-1", "Barbara Liskov", "substitution")),
        User::Administrator(StaffMember::new("admin-1", "Edsger Dijkstra", "semaphore")),
    ]
}

pub(super) fn id(raw: &str) -> UserId {
    UserId::new(raw)
}

pub(super) fn code(raw: &str) -> CourseCode {
    CourseCode::new(raw)
}

pub(super) fn catalog() -> Arc<InMemoryCourseCatalog> {
    Arc::new(InMemoryCourseCatalog::with_courses(courses()))
}

pub(super) fn directory() -> Arc<InMemoryUserDirectory> {
    Arc::new(InMemoryUserDirectory::with_users(users()).expect("fixture users are unique"))
}

pub(super) fn build_engine() -> (
    EnrollmentEngine<InMemoryCourseCatalog, InMemoryUserDirectory>,
    Arc<InMemoryCourseCatalog>,
    Arc<InMemoryUserDirectory>,
) {
    let catalog = catalog();
    let directory = directory();
    let engine = EnrollmentEngine::new(catalog.clone(), directory.clone());
    (engine, catalog, directory)
}

pub(super) fn build_service() -> (
    MemoryService,
    Arc<InMemoryCourseCatalog>,
    Arc<InMemoryUserDirectory>,
) {
    let catalog = catalog();
    let directory = directory();
    let service = RegistrationService::new(
        catalog.clone(),
        directory.clone(),
        RequestIdFormat::default(),
    );
    (service, catalog, directory)
}

/// Seat placeholder students until the course is at capacity.
pub(super) fn fill_course(catalog: &InMemoryCourseCatalog, course_code: &str) {
    let mut course = catalog
        .fetch(&code(course_code))
        .expect("fetch succeeds")
        .expect("course present");
    let mut seat = 0;
    while course.has_free_seat() {
        seat += 1;
        course.enrolled.insert(id(&format!("s-filler-{seat}")));
    }
    catalog.update(course).expect("update succeeds");
}

/// Delegates reads to an in-memory catalog but refuses writes.
pub(super) struct ReadOnlyCatalog {
    pub(super) inner: InMemoryCourseCatalog,
}

impl CourseCatalog for ReadOnlyCatalog {
    fn fetch(&self, code: &CourseCode) -> Result<Option<Course>, StoreError> {
        self.inner.fetch(code)
    }

    fn list(&self) -> Result<Vec<Course>, StoreError> {
        self.inner.list()
    }

    fn insert(&self, _course: Course) -> Result<Course, StoreError> {
        Err(StoreError::Unavailable("read only".to_string()))
    }

    fn update(&self, _course: Course) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read only".to_string()))
    }

    fn upsert(&self, _course: Course) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read only".to_string()))
    }

    fn remove(&self, _code: &CourseCode) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("read only".to_string()))
    }

    fn replace_all(&self, _courses: Vec<Course>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read only".to_string()))
    }
}

pub(super) struct UnavailableCatalog;

impl CourseCatalog for UnavailableCatalog {
    fn fetch(&self, _code: &CourseCode) -> Result<Option<Course>, StoreError> {
        Err(StoreError::Unavailable("catalog offline".to_string()))
    }

    fn list(&self) -> Result<Vec<Course>, StoreError> {
        Err(StoreError::Unavailable("catalog offline".to_string()))
    }

    fn insert(&self, _course: Course) -> Result<Course, StoreError> {
        Err(StoreError::Unavailable("catalog offline".to_string()))
    }

    fn update(&self, _course: Course) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("catalog offline".to_string()))
    }

    fn upsert(&self, _course: Course) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("catalog offline".to_string()))
    }

    fn remove(&self, _code: &CourseCode) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("catalog offline".to_string()))
    }

    fn replace_all(&self, _courses: Vec<Course>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("catalog offline".to_string()))
    }
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    registration_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
