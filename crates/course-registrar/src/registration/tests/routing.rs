use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::registration::requests::RequestIdFormat;
use crate::registration::router::list_courses_handler;
use crate::registration::service::RegistrationService;

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn enroll_route_returns_receipt() {
    let (service, _, _) = build_service();
    let app = router_with_service(service);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/enrollments",
            json!({ "student_id": "s-alan", "course_code": "CS101" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["course_title"], "Intro to Programming");
    assert_eq!(body["seats_remaining"], 1);
    assert_eq!(body["capacity_bypassed"], false);
}

#[tokio::test]
async fn full_course_suggests_special_request() {
    let (service, catalog, _) = build_service();
    fill_course(&catalog, "MATH150");
    let app = router_with_service(service);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/enrollments",
            json!({ "student_id": "s-alan", "course_code": "MATH150" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["kind"], "capacity_exceeded");
    assert_eq!(body["special_request_eligible"], true);
}

#[tokio::test]
async fn enrollment_rejections_map_to_status_codes() {
    let (service, _, _) = build_service();
    let app = router_with_service(service);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/enrollments",
            json!({ "student_id": "s-nobody", "course_code": "CS101" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert_eq!(body["kind"], "not_found");
    assert!(body.get("special_request_eligible").is_none());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/enrollments",
            json!({ "student_id": "s-alan", "course_code": "CS201" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["kind"], "prerequisites_not_met");
}

#[tokio::test]
async fn drop_route_releases_the_seat() {
    let (service, _, _) = build_service();
    service
        .enroll(&id("s-alan"), &code("CS101"))
        .expect("enrollment");
    let app = router_with_service(service);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/v1/enrollments/s-alan/CS101")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/v1/enrollments/s-alan/CS101")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["kind"], "not_registered");
}

#[tokio::test]
async fn special_request_can_be_submitted_and_approved() {
    let (service, catalog, _) = build_service();
    fill_course(&catalog, "MATH150");
    let app = router_with_service(service);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/requests",
            json!({ "student_id": "s-alan", "course_code": "MATH150" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["id"], "REQ0001");
    assert_eq!(body["status"], "PENDING");

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/requests",
            json!({ "student_id": "s-alan", "course_code": "MATH150" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/requests/REQ0001/approve",
            json!({ "reviewer": "adv-1", "comment": "senior standing" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["request"]["status"], "APPROVED");
    assert_eq!(body["enrollment"]["capacity_bypassed"], true);

    let response = app
        .clone()
        .oneshot(get("/api/v1/students/s-alan/courses"))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body[0]["code"], "MATH150");

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/requests/REQ0001/deny",
            json!({}),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn reviews_may_omit_the_body() {
    let (service, _, _) = build_service();
    service
        .submit_request(&id("s-alan"), &code("MATH150"))
        .expect("submission");
    service
        .submit_request(&id("s-ada"), &code("MATH150"))
        .expect("submission");
    let app = router_with_service(service);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/requests/REQ0001/approve")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["request"]["status"], "APPROVED");
    assert!(body["request"]["reviewer"].is_null());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/requests/REQ0002/deny")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["request"]["status"], "DENIED");
}

#[tokio::test]
async fn student_reviewer_is_forbidden() {
    let (service, _, _) = build_service();
    service
        .submit_request(&id("s-alan"), &code("MATH150"))
        .expect("submission");
    let app = router_with_service(service);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/requests/REQ0001/approve",
            json!({ "reviewer": "s-ada" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = read_json_body(response).await;
    assert_eq!(body["kind"], "forbidden");
}

#[tokio::test]
async fn request_listing_supports_filters() {
    let (service, _, _) = build_service();
    let first = service
        .submit_request(&id("s-alan"), &code("MATH150"))
        .expect("submission");
    service
        .submit_request(&id("s-ada"), &code("CS301"))
        .expect("submission");
    service
        .deny_request(&first.id, Default::default())
        .expect("denial");
    let app = router_with_service(service);

    let response = app
        .clone()
        .oneshot(get("/api/v1/requests?status=pending"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["id"], "REQ0002");

    let response = app
        .clone()
        .oneshot(get("/api/v1/requests?student_id=s-alan&status=DENIED"))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["status"], "DENIED");

    let response = app
        .clone()
        .oneshot(get("/api/v1/requests"))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(2));

    let response = app
        .clone()
        .oneshot(get("/api/v1/requests?status=archived"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get("/api/v1/requests/REQ0404"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn catalog_routes_report_courses_and_prerequisites() {
    let (service, catalog, _) = build_service();
    fill_course(&catalog, "MATH150");
    let app = router_with_service(service);

    let response = app
        .clone()
        .oneshot(get("/api/v1/courses"))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(5));

    let response = app
        .clone()
        .oneshot(get("/api/v1/courses/available"))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(4));

    let response = app
        .clone()
        .oneshot(get("/api/v1/courses/CS301/prerequisites"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["prerequisites"], json!(["CS201", "CS101"]));

    let response = app
        .clone()
        .oneshot(get("/api/v1/courses/NOPE999/prerequisites"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(get("/api/v1/students/s-nobody/courses"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn store_outage_surfaces_as_server_error() {
    let service = Arc::new(RegistrationService::new(
        Arc::new(UnavailableCatalog),
        directory(),
        RequestIdFormat::default(),
    ));

    let response = list_courses_handler(State(service)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json_body(response).await;
    assert_eq!(body["kind"], "unavailable");
}
