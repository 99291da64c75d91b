use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::reports::domain::ReportStatus;
use crate::workflows::reports::router::submission_error_response;
use crate::workflows::reports::SubmissionError;

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serialise body")))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

#[tokio::test]
async fn submit_route_auto_approves_verified_photo() {
    let router = router_with(
        MemoryReportStore::default(),
        Vec::new(),
        ScriptedClassifier::labels(&[("smokestack", 0.93)]),
    );

    let response = router
        .oneshot(post_json(
            "/api/v1/reports",
            json!({
                "type": "Air Emission",
                "description": DESCRIPTION,
                "latitude": 18.52,
                "longitude": 73.85,
                "photo": {
                    "file_name": "chimney.jpg",
                    "content_type": "image/jpeg",
                    "data": "/9j/4AAQ"
                }
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], "approved");
    assert_eq!(payload["auto_approved"], true);
    assert!(payload.get("report_id").is_some());
}

#[tokio::test]
async fn submit_route_accepts_phone_sized_photos() {
    let router = router_with(
        MemoryReportStore::default(),
        Vec::new(),
        ScriptedClassifier::labels(&[("trash can", 0.64)]),
    );
    let photo = vec![0xA5_u8; 3 * 1024 * 1024];

    let response = router
        .oneshot(post_json(
            "/api/v1/reports",
            json!({
                "type": "Waste Dumping",
                "description": DESCRIPTION,
                "latitude": 18.52,
                "longitude": 73.85,
                "photo": {
                    "file_name": "riverbank.jpg",
                    "content_type": "image/jpeg",
                    "data": STANDARD.encode(&photo)
                }
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["auto_approved"], true);
}

#[tokio::test]
async fn submit_route_rejects_bodies_over_the_limit() {
    let store = Arc::new(MemoryReportStore::default());
    let router = router_with_limit(store.clone(), Vec::new(), ScriptedClassifier::labels(&[]), 1024);

    let response = router
        .oneshot(post_json(
            "/api/v1/reports",
            json!({
                "type": "Waste Dumping",
                "description": "x".repeat(4096),
                "latitude": 18.52,
                "longitude": 73.85
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(store.create_calls(), 0);
}

#[tokio::test]
async fn submit_route_lists_all_field_errors() {
    let router = router_with(MemoryReportStore::default(), Vec::new(), ScriptedClassifier::labels(&[]));

    let response = router
        .oneshot(post_json(
            "/api/v1/reports",
            json!({ "type": "", "description": "", "latitude": 1.0, "longitude": 1.0 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    let fields = payload["fields"].as_array().expect("field list");
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0]["field"], "type");
    assert_eq!(fields[1]["code"], "missing_description");
}

#[tokio::test]
async fn submit_route_requires_both_coordinates() {
    let router = router_with(MemoryReportStore::default(), Vec::new(), ScriptedClassifier::labels(&[]));

    let response = router
        .oneshot(post_json(
            "/api/v1/reports",
            json!({ "type": "Oil Spill", "description": DESCRIPTION, "latitude": 1.0 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .expect("error message")
        .contains("location"));
}

#[tokio::test]
async fn submit_route_rejects_invalid_photo_encoding() {
    let router = router_with(MemoryReportStore::default(), Vec::new(), ScriptedClassifier::labels(&[]));

    let response = router
        .oneshot(post_json(
            "/api/v1/reports",
            json!({
                "type": "Oil Spill",
                "description": DESCRIPTION,
                "latitude": 1.0,
                "longitude": 1.0,
                "photo": { "file_name": "x.jpg", "content_type": "image/jpeg", "data": "%%%" }
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn status_query_filters_reports() {
    let store = MemoryReportStore::with_reports(vec![
        stored_report("r1", "user-a", ReportStatus::Pending, false),
        stored_report("r2", "user-a", ReportStatus::Approved, true),
    ]);
    let router = router_with(store, Vec::new(), ScriptedClassifier::labels(&[]));

    let response = router
        .oneshot(get("/api/v1/reports?status=approved"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let reports = payload.as_array().expect("report list");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["id"], "r2");
    assert_eq!(reports[0]["type"], "Waste Dumping");
}

#[tokio::test]
async fn leaderboard_route_returns_ranked_entries() {
    let store = MemoryReportStore::with_reports(vec![
        stored_report("r1", "user-a", ReportStatus::Approved, false),
        stored_report("r2", "user-c", ReportStatus::Approved, false),
    ]);
    let users = vec![user("user-a", "Asha", 50), user("user-c", "Chen", 70)];
    let router = router_with(store, users, ScriptedClassifier::labels(&[]));

    let response = router
        .oneshot(get("/api/v1/leaderboard"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload[0]["name"], "Chen");
    assert_eq!(payload[1]["approved_report_count"], 1);
}

#[tokio::test]
async fn report_route_returns_not_found() {
    let router = router_with(MemoryReportStore::default(), Vec::new(), ScriptedClassifier::labels(&[]));

    let response = router
        .oneshot(get("/api/v1/reports/rep-missing"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pending_route_is_not_shadowed_by_id_route() {
    let store = MemoryReportStore::with_reports(vec![stored_report(
        "r1",
        "user-a",
        ReportStatus::Pending,
        false,
    )]);
    let router = router_with(store, Vec::new(), ScriptedClassifier::labels(&[]));

    let response = router
        .oneshot(get("/api/v1/reports/pending"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload.as_array().map(Vec::len), Some(1));
}

#[test]
fn submission_errors_map_to_status_codes() {
    assert_eq!(
        submission_error_response(SubmissionError::SubmitterForbidden).status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        submission_error_response(SubmissionError::LocationRequired).status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
}
