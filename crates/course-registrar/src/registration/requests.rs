use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::domain::{
    CourseCode, RequestId, RequestStatus, Review, SpecialRegistrationRequest, UserId,
};
use super::enrollment::{
    store_kind, EnrollmentEngine, EnrollmentError, EnrollmentReceipt, FailureKind,
};
use super::repository::{CourseCatalog, StoreError, UserDirectory};

const DEFAULT_PREFIX: &str = "REQ";
const DEFAULT_WIDTH: usize = 4;

/// Request numbering: a fixed prefix followed by a zero-padded sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdFormat {
    prefix: String,
    width: usize,
}

impl RequestIdFormat {
    pub fn new(prefix: impl Into<String>, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            width,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn format(&self, sequence: u64) -> RequestId {
        RequestId(format!(
            "{}{:0width$}",
            self.prefix,
            sequence,
            width = self.width
        ))
    }

    /// Numeric suffix of an id issued under this format, if it has one.
    pub fn sequence_of(&self, id: &RequestId) -> Option<u64> {
        id.as_str().strip_prefix(self.prefix.as_str())?.parse().ok()
    }
}

impl Default for RequestIdFormat {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_WIDTH)
    }
}

/// Result of resolving a request. `enrollment` is empty for denials and for approvals
/// whose student or course disappeared, or whose student was already registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDecision {
    pub request: SpecialRegistrationRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment: Option<EnrollmentReceipt>,
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("student {0} not found")]
    StudentNotFound(UserId),
    #[error("course {0} not found")]
    CourseNotFound(CourseCode),
    #[error("request {0} not found")]
    RequestNotFound(RequestId),
    #[error("student {student_id} already has pending request {existing} for {course_code}")]
    DuplicatePending {
        student_id: UserId,
        course_code: CourseCode,
        existing: RequestId,
    },
    #[error("request {request_id} has already been processed ({})", .status.label())]
    AlreadyProcessed {
        request_id: RequestId,
        status: RequestStatus,
    },
    #[error("{0} is not allowed to review special registration requests")]
    ReviewerNotAuthorized(UserId),
    #[error("request {request_id} was approved but enrollment failed: {source}")]
    Enrollment {
        request_id: RequestId,
        #[source]
        source: EnrollmentError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RequestError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RequestError::StudentNotFound(_)
            | RequestError::CourseNotFound(_)
            | RequestError::RequestNotFound(_) => FailureKind::NotFound,
            RequestError::DuplicatePending { .. } | RequestError::AlreadyProcessed { .. } => {
                FailureKind::Conflict
            }
            RequestError::ReviewerNotAuthorized(_) => FailureKind::Forbidden,
            RequestError::Enrollment { source, .. } => source.kind(),
            RequestError::Store(error) => store_kind(error),
        }
    }
}

struct RequestLedger {
    requests: Vec<SpecialRegistrationRequest>,
    next_sequence: u64,
}

/// Lifecycle of special-registration requests: `PENDING` until a single approval or
/// denial, never removed.
pub struct RequestWorkflow {
    format: RequestIdFormat,
    ledger: Mutex<RequestLedger>,
}

impl Default for RequestWorkflow {
    fn default() -> Self {
        Self::new(RequestIdFormat::default())
    }
}

impl RequestWorkflow {
    pub fn new(format: RequestIdFormat) -> Self {
        Self {
            format,
            ledger: Mutex::new(RequestLedger {
                requests: Vec::new(),
                next_sequence: 1,
            }),
        }
    }

    pub fn id_format(&self) -> &RequestIdFormat {
        &self.format
    }

    pub fn submit<C, D>(
        &self,
        engine: &EnrollmentEngine<C, D>,
        student_id: &UserId,
        course_code: &CourseCode,
    ) -> Result<SpecialRegistrationRequest, RequestError>
    where
        C: CourseCatalog + 'static,
        D: UserDirectory + 'static,
    {
        if engine.student(student_id)?.is_none() {
            return Err(RequestError::StudentNotFound(student_id.clone()));
        }
        if engine.course(course_code)?.is_none() {
            return Err(RequestError::CourseNotFound(course_code.clone()));
        }

        let mut ledger = self.ledger()?;
        if let Some(existing) = ledger
            .requests
            .iter()
            .find(|request| request.is_pending() && request.matches_pair(student_id, course_code))
        {
            return Err(RequestError::DuplicatePending {
                student_id: student_id.clone(),
                course_code: course_code.clone(),
                existing: existing.id.clone(),
            });
        }

        let id = self.format.format(ledger.next_sequence);
        ledger.next_sequence += 1;

        let request =
            SpecialRegistrationRequest::pending(id, student_id.clone(), course_code.clone());
        ledger.requests.push(request.clone());

        info!(
            request = %request.id,
            student = %student_id,
            course = %course_code,
            "special registration request submitted"
        );
        Ok(request)
    }

    /// Approve a pending request and enroll the student past capacity. The decision is
    /// recorded even when the enrollment cannot happen.
    pub fn approve<C, D>(
        &self,
        engine: &EnrollmentEngine<C, D>,
        request_id: &RequestId,
        review: Review,
    ) -> Result<RequestDecision, RequestError>
    where
        C: CourseCatalog + 'static,
        D: UserDirectory + 'static,
    {
        let mut ledger = self.ledger()?;
        let request = resolve(&mut ledger, request_id, RequestStatus::Approved, review)?;

        let enrollment =
            match engine.enroll_bypassing_capacity(&request.student_id, &request.course_code) {
                Ok(receipt) => Some(receipt),
                Err(
                    error @ (EnrollmentError::StudentNotFound(_)
                    | EnrollmentError::CourseNotFound(_)
                    | EnrollmentError::AlreadyRegistered { .. }),
                ) => {
                    debug!(
                        request = %request.id,
                        %error,
                        "approved request left enrollment unchanged"
                    );
                    None
                }
                Err(source) => {
                    return Err(RequestError::Enrollment {
                        request_id: request.id,
                        source,
                    })
                }
            };

        info!(
            request = %request.id,
            student = %request.student_id,
            course = %request.course_code,
            enrolled = enrollment.is_some(),
            "special registration request approved"
        );
        Ok(RequestDecision {
            request,
            enrollment,
        })
    }

    pub fn deny(
        &self,
        request_id: &RequestId,
        review: Review,
    ) -> Result<RequestDecision, RequestError> {
        let mut ledger = self.ledger()?;
        let request = resolve(&mut ledger, request_id, RequestStatus::Denied, review)?;

        info!(
            request = %request.id,
            student = %request.student_id,
            course = %request.course_code,
            "special registration request denied"
        );
        Ok(RequestDecision {
            request,
            enrollment: None,
        })
    }

    pub fn request(
        &self,
        request_id: &RequestId,
    ) -> Result<Option<SpecialRegistrationRequest>, StoreError> {
        Ok(self
            .ledger()?
            .requests
            .iter()
            .find(|request| &request.id == request_id)
            .cloned())
    }

    pub fn list_pending(&self) -> Result<Vec<SpecialRegistrationRequest>, StoreError> {
        self.filtered(|request| request.is_pending())
    }

    pub fn list_by_student(
        &self,
        student_id: &UserId,
    ) -> Result<Vec<SpecialRegistrationRequest>, StoreError> {
        self.filtered(|request| &request.student_id == student_id)
    }

    pub fn list_all(&self) -> Result<Vec<SpecialRegistrationRequest>, StoreError> {
        self.filtered(|_| true)
    }

    /// Swap in a full set of requests (e.g. from a snapshot) and continue numbering
    /// after the highest parsable suffix.
    pub fn replace_all(&self, requests: Vec<SpecialRegistrationRequest>) -> Result<(), StoreError> {
        let highest = requests
            .iter()
            .filter_map(|request| self.format.sequence_of(&request.id))
            .max()
            .unwrap_or(0);

        let mut ledger = self.ledger()?;
        ledger.requests = requests;
        ledger.next_sequence = highest + 1;
        debug!(
            count = ledger.requests.len(),
            next_sequence = ledger.next_sequence,
            "special registration requests replaced"
        );
        Ok(())
    }

    /// Id the next submission will receive.
    pub fn next_request_id(&self) -> Result<RequestId, StoreError> {
        let ledger = self.ledger()?;
        Ok(self.format.format(ledger.next_sequence))
    }

    fn filtered(
        &self,
        keep: impl Fn(&SpecialRegistrationRequest) -> bool,
    ) -> Result<Vec<SpecialRegistrationRequest>, StoreError> {
        Ok(self
            .ledger()?
            .requests
            .iter()
            .filter(|request| keep(request))
            .cloned()
            .collect())
    }

    fn ledger(&self) -> Result<MutexGuard<'_, RequestLedger>, StoreError> {
        self.ledger
            .lock()
            .map_err(|_| StoreError::Unavailable("request ledger poisoned".to_string()))
    }
}

fn resolve(
    ledger: &mut RequestLedger,
    request_id: &RequestId,
    status: RequestStatus,
    review: Review,
) -> Result<SpecialRegistrationRequest, RequestError> {
    let request = ledger
        .requests
        .iter_mut()
        .find(|request| &request.id == request_id)
        .ok_or_else(|| RequestError::RequestNotFound(request_id.clone()))?;

    request
        .resolve(status, review)
        .map_err(|current| RequestError::AlreadyProcessed {
            request_id: request_id.clone(),
            status: current,
        })?;

    Ok(request.clone())
}
