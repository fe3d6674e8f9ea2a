use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog key for a course offering (e.g. `CS101`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseCode(pub String);

impl CourseCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Directory key shared by students and staff.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for special-registration requests (e.g. `REQ0007`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Course definition held by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub code: CourseCode,
    pub title: String,
    /// Descriptor such as `MW 10:00-11:30`, parsed on demand by the schedule module.
    pub schedule: String,
    pub capacity: u32,
    #[serde(default)]
    pub enrolled: BTreeSet<UserId>,
    #[serde(default)]
    pub prerequisites: Vec<CourseCode>,
}

impl Course {
    pub fn new(
        code: impl Into<String>,
        title: impl Into<String>,
        schedule: impl Into<String>,
        capacity: u32,
    ) -> Self {
        Self {
            code: CourseCode::new(code),
            title: title.into(),
            schedule: schedule.into(),
            capacity,
            enrolled: BTreeSet::new(),
            prerequisites: Vec::new(),
        }
    }

    pub fn with_prerequisites<I, S>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prerequisites = prerequisites.into_iter().map(CourseCode::new).collect();
        self
    }

    pub fn enrolled_count(&self) -> usize {
        self.enrolled.len()
    }

    pub fn has_free_seat(&self) -> bool {
        self.enrolled.len() < self.capacity as usize
    }

    pub fn seats_remaining(&self) -> u32 {
        let taken = u32::try_from(self.enrolled.len()).unwrap_or(u32::MAX);
        self.capacity.saturating_sub(taken)
    }

    pub fn is_enrolled(&self, student_id: &UserId) -> bool {
        self.enrolled.contains(student_id)
    }
}

/// Student record: registered courses keep registration order and never repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: UserId,
    pub name: String,
    pub credential: String,
    #[serde(default)]
    pub registered: Vec<CourseCode>,
    #[serde(default)]
    pub completed: BTreeSet<CourseCode>,
}

impl Student {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
            credential: credential.into(),
            registered: Vec::new(),
            completed: BTreeSet::new(),
        }
    }

    pub fn with_completed<I, S>(mut self, completed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.completed = completed.into_iter().map(CourseCode::new).collect();
        self
    }

    pub fn is_registered(&self, code: &CourseCode) -> bool {
        self.registered.contains(code)
    }

    pub fn has_completed(&self, code: &CourseCode) -> bool {
        self.completed.contains(code)
    }

    /// Returns `false` when the code was already present.
    pub(crate) fn register(&mut self, code: CourseCode) -> bool {
        if self.is_registered(&code) {
            return false;
        }
        self.registered.push(code);
        true
    }

    pub(crate) fn unregister(&mut self, code: &CourseCode) -> bool {
        let before = self.registered.len();
        self.registered.retain(|existing| existing != code);
        before != self.registered.len()
    }
}

/// Advisor or administrator record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: UserId,
    pub name: String,
    pub credential: String,
    #[serde(default)]
    pub department: Option<String>,
}

impl StaffMember {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
            credential: credential.into(),
            department: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Advisor,
    Administrator,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Advisor => "advisor",
            Role::Administrator => "administrator",
        }
    }

    pub const fn capabilities(self) -> Capabilities {
        match self {
            Role::Student => Capabilities {
                can_enroll: true,
                can_review_requests: false,
                can_manage_catalog: false,
            },
            Role::Advisor => Capabilities {
                can_enroll: false,
                can_review_requests: true,
                can_manage_catalog: false,
            },
            Role::Administrator => Capabilities {
                can_enroll: false,
                can_review_requests: true,
                can_manage_catalog: true,
            },
        }
    }
}

/// What a role is allowed to do inside the registrar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub can_enroll: bool,
    pub can_review_requests: bool,
    pub can_manage_catalog: bool,
}

/// Any account known to the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum User {
    Student(Student),
    Advisor(StaffMember),
    Administrator(StaffMember),
}

impl User {
    pub fn id(&self) -> &UserId {
        match self {
            User::Student(student) => &student.id,
            User::Advisor(staff) | User::Administrator(staff) => &staff.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            User::Student(student) => &student.name,
            User::Advisor(staff) | User::Administrator(staff) => &staff.name,
        }
    }

    pub(crate) fn credential(&self) -> &str {
        match self {
            User::Student(student) => &student.credential,
            User::Advisor(staff) | User::Administrator(staff) => &staff.credential,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            User::Student(_) => Role::Student,
            User::Advisor(_) => Role::Advisor,
            User::Administrator(_) => Role::Administrator,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        self.role().capabilities()
    }
}

/// Lifecycle of a special-registration request. Both resolutions are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Denied,
}

impl RequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Denied => "DENIED",
        }
    }

    pub const fn is_pending(self) -> bool {
        matches!(self, RequestStatus::Pending)
    }
}

/// Staff input attached to an approval or denial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default, alias = "reviewer_id")]
    pub reviewer: Option<UserId>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Review {
    pub fn comment(comment: impl Into<String>) -> Self {
        Self {
            reviewer: None,
            comment: Some(comment.into()),
        }
    }

    pub fn by(mut self, reviewer: impl Into<String>) -> Self {
        self.reviewer = Some(UserId::new(reviewer));
        self
    }
}

/// Escalation of a capacity-blocked enrollment awaiting staff review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialRegistrationRequest {
    pub id: RequestId,
    pub student_id: UserId,
    pub course_code: CourseCode,
    pub status: RequestStatus,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub reviewer: Option<UserId>,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl SpecialRegistrationRequest {
    pub fn pending(id: RequestId, student_id: UserId, course_code: CourseCode) -> Self {
        Self {
            id,
            student_id,
            course_code,
            status: RequestStatus::Pending,
            comment: None,
            reviewer: None,
            submitted_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    pub(crate) fn matches_pair(&self, student_id: &UserId, course_code: &CourseCode) -> bool {
        &self.student_id == student_id && &self.course_code == course_code
    }

    /// Move out of `Pending`. Returns the current status when already resolved.
    pub(crate) fn resolve(
        &mut self,
        status: RequestStatus,
        review: Review,
    ) -> Result<(), RequestStatus> {
        match self.status {
            RequestStatus::Pending => {}
            resolved @ (RequestStatus::Approved | RequestStatus::Denied) => return Err(resolved),
        }

        self.status = status;
        self.comment = review.comment;
        self.reviewer = review.reviewer;
        self.resolved_at = Some(Utc::now());
        Ok(())
    }
}
