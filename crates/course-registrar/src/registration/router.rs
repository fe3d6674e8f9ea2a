use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{CourseCode, RequestId, RequestStatus, Review, UserId};
use super::enrollment::{store_kind, EnrollmentError, FailureKind};
use super::repository::{CourseCatalog, StoreError, UserDirectory};
use super::requests::RequestError;
use super::service::RegistrationService;

type SharedService<C, D> = Arc<RegistrationService<C, D>>;

/// Router builder exposing enrollment and special-request endpoints.
pub fn registration_router<C, D>(service: SharedService<C, D>) -> Router
where
    C: CourseCatalog + 'static,
    D: UserDirectory + 'static,
{
    Router::new()
        .route("/api/v1/courses", get(list_courses_handler::<C, D>))
        .route(
            "/api/v1/courses/available",
            get(available_courses_handler::<C, D>),
        )
        .route(
            "/api/v1/courses/:course_code/prerequisites",
            get(prerequisites_handler::<C, D>),
        )
        .route(
            "/api/v1/students/:student_id/courses",
            get(student_courses_handler::<C, D>),
        )
        .route("/api/v1/enrollments", post(enroll_handler::<C, D>))
        .route(
            "/api/v1/enrollments/:student_id/:course_code",
            delete(drop_handler::<C, D>),
        )
        .route(
            "/api/v1/requests",
            get(list_requests_handler::<C, D>).post(submit_handler::<C, D>),
        )
        .route("/api/v1/requests/:request_id", get(request_handler::<C, D>))
        .route(
            "/api/v1/requests/:request_id/approve",
            post(approve_handler::<C, D>),
        )
        .route(
            "/api/v1/requests/:request_id/deny",
            post(deny_handler::<C, D>),
        )
        .with_state(service)
}

/// Body shared by enrollment and special-request submission.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentPayload {
    pub student_id: String,
    pub course_code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestFilter {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
}

pub(crate) fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::NotFound => StatusCode::NOT_FOUND,
        FailureKind::Conflict => StatusCode::CONFLICT,
        FailureKind::Forbidden => StatusCode::FORBIDDEN,
        FailureKind::CapacityExceeded
        | FailureKind::ScheduleConflict
        | FailureKind::PrerequisitesNotMet
        | FailureKind::NotRegistered => StatusCode::UNPROCESSABLE_ENTITY,
        FailureKind::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(kind: FailureKind, message: String) -> Response {
    let payload = json!({
        "error": message,
        "kind": kind.label(),
    });
    (status_for(kind), Json(payload)).into_response()
}

fn store_failure(error: StoreError) -> Response {
    failure(store_kind(&error), error.to_string())
}

fn enrollment_failure(error: EnrollmentError) -> Response {
    if error.suggests_special_request() {
        let kind = error.kind();
        let payload = json!({
            "error": error.to_string(),
            "kind": kind.label(),
            "special_request_eligible": true,
        });
        return (status_for(kind), Json(payload)).into_response();
    }
    failure(error.kind(), error.to_string())
}

fn request_failure(error: RequestError) -> Response {
    failure(error.kind(), error.to_string())
}

fn parse_status(raw: &str) -> Option<RequestStatus> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pending" => Some(RequestStatus::Pending),
        "approved" => Some(RequestStatus::Approved),
        "denied" => Some(RequestStatus::Denied),
        _ => None,
    }
}

pub(crate) async fn list_courses_handler<C, D>(
    State(service): State<SharedService<C, D>>,
) -> Response
where
    C: CourseCatalog + 'static,
    D: UserDirectory + 'static,
{
    match service.courses() {
        Ok(courses) => (StatusCode::OK, Json(courses)).into_response(),
        Err(error) => store_failure(error),
    }
}

pub(crate) async fn available_courses_handler<C, D>(
    State(service): State<SharedService<C, D>>,
) -> Response
where
    C: CourseCatalog + 'static,
    D: UserDirectory + 'static,
{
    match service.available_courses() {
        Ok(courses) => (StatusCode::OK, Json(courses)).into_response(),
        Err(error) => store_failure(error),
    }
}

pub(crate) async fn prerequisites_handler<C, D>(
    State(service): State<SharedService<C, D>>,
    Path(course_code): Path<String>,
) -> Response
where
    C: CourseCatalog + 'static,
    D: UserDirectory + 'static,
{
    let code = CourseCode(course_code);
    match service.course(&code) {
        Ok(Some(_)) => {}
        Ok(None) => return failure(FailureKind::NotFound, format!("course {code} not found")),
        Err(error) => return store_failure(error),
    }

    match service.prerequisite_closure(&code) {
        Ok(prerequisites) => {
            let payload = json!({
                "course_code": code,
                "prerequisites": prerequisites,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => store_failure(error),
    }
}

pub(crate) async fn student_courses_handler<C, D>(
    State(service): State<SharedService<C, D>>,
    Path(student_id): Path<String>,
) -> Response
where
    C: CourseCatalog + 'static,
    D: UserDirectory + 'static,
{
    let id = UserId(student_id);
    match service.student(&id) {
        Ok(Some(_)) => {}
        Ok(None) => return failure(FailureKind::NotFound, format!("student {id} not found")),
        Err(error) => return store_failure(error),
    }

    match service.student_courses(&id) {
        Ok(courses) => (StatusCode::OK, Json(courses)).into_response(),
        Err(error) => store_failure(error),
    }
}

pub(crate) async fn enroll_handler<C, D>(
    State(service): State<SharedService<C, D>>,
    Json(payload): Json<EnrollmentPayload>,
) -> Response
where
    C: CourseCatalog + 'static,
    D: UserDirectory + 'static,
{
    let student_id = UserId(payload.student_id);
    let course_code = CourseCode(payload.course_code);
    match service.enroll(&student_id, &course_code) {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(error) => enrollment_failure(error),
    }
}

pub(crate) async fn drop_handler<C, D>(
    State(service): State<SharedService<C, D>>,
    Path((student_id, course_code)): Path<(String, String)>,
) -> Response
where
    C: CourseCatalog + 'static,
    D: UserDirectory + 'static,
{
    match service.drop_course(&UserId(student_id), &CourseCode(course_code)) {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(error) => enrollment_failure(error),
    }
}

pub(crate) async fn list_requests_handler<C, D>(
    State(service): State<SharedService<C, D>>,
    Query(filter): Query<RequestFilter>,
) -> Response
where
    C: CourseCatalog + 'static,
    D: UserDirectory + 'static,
{
    let status = match filter.status.as_deref().map(parse_status) {
        Some(Some(status)) => Some(status),
        Some(None) => {
            let payload = json!({ "error": "status must be pending, approved, or denied" });
            return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        }
        None => None,
    };

    let requests = match (&filter.student_id, status) {
        (Some(student_id), _) => service.requests_for_student(&UserId(student_id.clone())),
        (None, Some(RequestStatus::Pending)) => service.pending_requests(),
        (None, _) => service.all_requests(),
    };

    match requests {
        Ok(requests) => {
            let requests: Vec<_> = requests
                .into_iter()
                .filter(|request| status.map_or(true, |status| request.status == status))
                .collect();
            (StatusCode::OK, Json(requests)).into_response()
        }
        Err(error) => store_failure(error),
    }
}

pub(crate) async fn submit_handler<C, D>(
    State(service): State<SharedService<C, D>>,
    Json(payload): Json<EnrollmentPayload>,
) -> Response
where
    C: CourseCatalog + 'static,
    D: UserDirectory + 'static,
{
    let student_id = UserId(payload.student_id);
    let course_code = CourseCode(payload.course_code);
    match service.submit_request(&student_id, &course_code) {
        Ok(request) => (StatusCode::CREATED, Json(request)).into_response(),
        Err(error) => request_failure(error),
    }
}

pub(crate) async fn request_handler<C, D>(
    State(service): State<SharedService<C, D>>,
    Path(request_id): Path<String>,
) -> Response
where
    C: CourseCatalog + 'static,
    D: UserDirectory + 'static,
{
    let id = RequestId(request_id);
    match service.request(&id) {
        Ok(Some(request)) => (StatusCode::OK, Json(request)).into_response(),
        Ok(None) => request_failure(RequestError::RequestNotFound(id)),
        Err(error) => store_failure(error),
    }
}

pub(crate) async fn approve_handler<C, D>(
    State(service): State<SharedService<C, D>>,
    Path(request_id): Path<String>,
    body: Option<Json<Review>>,
) -> Response
where
    C: CourseCatalog + 'static,
    D: UserDirectory + 'static,
{
    let review = body.map(|Json(review)| review).unwrap_or_default();
    match service.approve_request(&RequestId(request_id), review) {
        Ok(decision) => (StatusCode::OK, Json(decision)).into_response(),
        Err(error) => request_failure(error),
    }
}

pub(crate) async fn deny_handler<C, D>(
    State(service): State<SharedService<C, D>>,
    Path(request_id): Path<String>,
    body: Option<Json<Review>>,
) -> Response
where
    C: CourseCatalog + 'static,
    D: UserDirectory + 'static,
{
    let review = body.map(|Json(review)| review).unwrap_or_default();
    match service.deny_request(&RequestId(request_id), review) {
        Ok(decision) => (StatusCode::OK, Json(decision)).into_response(),
        Err(error) => request_failure(error),
    }
}
