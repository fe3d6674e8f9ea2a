use serde::{Deserialize, Serialize};

use super::super::domain::{CourseCode, UserId};
use super::super::repository::StoreError;

/// Coarse failure taxonomy shared by enrollment and request operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    Conflict,
    CapacityExceeded,
    ScheduleConflict,
    PrerequisitesNotMet,
    NotRegistered,
    Forbidden,
    Unavailable,
}

impl FailureKind {
    pub const fn label(self) -> &'static str {
        match self {
            FailureKind::NotFound => "not_found",
            FailureKind::Conflict => "conflict",
            FailureKind::CapacityExceeded => "capacity_exceeded",
            FailureKind::ScheduleConflict => "schedule_conflict",
            FailureKind::PrerequisitesNotMet => "prerequisites_not_met",
            FailureKind::NotRegistered => "not_registered",
            FailureKind::Forbidden => "forbidden",
            FailureKind::Unavailable => "unavailable",
        }
    }
}

/// Successful enrollment, including how it was admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentReceipt {
    pub student_id: UserId,
    pub course_code: CourseCode,
    pub course_title: String,
    pub seats_remaining: u32,
    pub capacity_bypassed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropReceipt {
    pub student_id: UserId,
    pub course_code: CourseCode,
    pub course_title: String,
}

/// Rejections produced by enroll and drop, in the order the checks run, plus course
/// updates that would strand enrolled students.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrollmentError {
    #[error("student {0} not found")]
    StudentNotFound(UserId),
    #[error("course {0} not found")]
    CourseNotFound(CourseCode),
    #[error("student {student_id} is already registered for {course_code}")]
    AlreadyRegistered {
        student_id: UserId,
        course_code: CourseCode,
    },
    #[error("course {course_code} is full ({capacity} seats)")]
    CourseFull {
        course_code: CourseCode,
        capacity: u32,
    },
    #[error("{course_code} conflicts with registered course {conflicting}")]
    ScheduleConflict {
        course_code: CourseCode,
        conflicting: CourseCode,
    },
    #[error("prerequisites not completed for {course_code}: {}", join_codes(.missing))]
    PrerequisitesNotMet {
        course_code: CourseCode,
        missing: Vec<CourseCode>,
    },
    #[error("student {student_id} is not registered for {course_code}")]
    NotRegistered {
        student_id: UserId,
        course_code: CourseCode,
    },
    #[error("course {course_code} cannot shrink to {capacity} seats with {enrolled} enrolled")]
    CapacityBelowEnrollment {
        course_code: CourseCode,
        capacity: u32,
        enrolled: usize,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EnrollmentError {
    pub fn kind(&self) -> FailureKind {
        match self {
            EnrollmentError::StudentNotFound(_) | EnrollmentError::CourseNotFound(_) => {
                FailureKind::NotFound
            }
            EnrollmentError::AlreadyRegistered { .. }
            | EnrollmentError::CapacityBelowEnrollment { .. } => FailureKind::Conflict,
            EnrollmentError::CourseFull { .. } => FailureKind::CapacityExceeded,
            EnrollmentError::ScheduleConflict { .. } => FailureKind::ScheduleConflict,
            EnrollmentError::PrerequisitesNotMet { .. } => FailureKind::PrerequisitesNotMet,
            EnrollmentError::NotRegistered { .. } => FailureKind::NotRegistered,
            EnrollmentError::Store(error) => store_kind(error),
        }
    }

    /// Only a full course can be escalated into a special-registration request.
    pub fn suggests_special_request(&self) -> bool {
        matches!(self, EnrollmentError::CourseFull { .. })
    }
}

pub(crate) fn store_kind(error: &StoreError) -> FailureKind {
    match error {
        StoreError::Conflict => FailureKind::Conflict,
        StoreError::NotFound => FailureKind::NotFound,
        StoreError::Unavailable(_) => FailureKind::Unavailable,
    }
}

fn join_codes(codes: &[CourseCode]) -> String {
    codes
        .iter()
        .map(CourseCode::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
