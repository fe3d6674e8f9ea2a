//! Enrollment decisions and the special-registration approval workflow.
//!
//! `EnrollmentEngine` owns the enroll/drop rules (capacity, schedule conflicts,
//! prerequisites). `RequestWorkflow` escalates capacity-blocked enrollments into
//! requests that staff approve or deny. `RegistrationService` composes both over a
//! `CourseCatalog` and a `UserDirectory`.

pub mod domain;
pub mod enrollment;
pub mod repository;
pub mod requests;
pub mod router;
pub mod schedule;
pub mod service;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use domain::{
    Capabilities, Course, CourseCode, RequestId, RequestStatus, Review, Role,
    SpecialRegistrationRequest, StaffMember, Student, User, UserId,
};
pub use enrollment::{
    has_completed_prerequisites, missing_prerequisites, DropReceipt, EnrollmentEngine,
    EnrollmentError, EnrollmentReceipt, FailureKind,
};
pub use repository::{
    CourseCatalog, InMemoryCourseCatalog, InMemoryUserDirectory, StoreError, UserDirectory,
};
pub use requests::{RequestDecision, RequestError, RequestIdFormat, RequestWorkflow};
pub use router::registration_router;
pub use schedule::{schedules_overlap, ScheduleParseError, ScheduleSlot};
pub use service::RegistrationService;
pub use snapshot::{RegistrarSnapshot, SnapshotError};
