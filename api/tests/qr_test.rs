mod helpers;

use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use db::models::student;
use helpers::{TestApp, make_test_app, send_json};
use serde_json::{Value, json};
use serial_test::serial;
use util::config::AppConfig;

async fn create_session(app: &TestApp, body: Value) -> Value {
    let (status, json) = send_json(app, "POST", "/api/qr/sessions", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{json}");
    json["data"].clone()
}

async fn maths(app: &TestApp) -> Value {
    create_session(
        app,
        json!({"subject": "Mathematics", "issuer": "Mr. Smith", "location": "Room 12"}),
    )
    .await
}

async fn scan(app: &TestApp, qr_data: &str, student_id: &str) -> (StatusCode, Value) {
    send_json(
        app,
        "POST",
        "/api/qr/scan",
        Some(json!({"qr_data": qr_data, "student_id": student_id})),
    )
    .await
}

async fn add_student(app: &TestApp, external_id: &str, name: &str) {
    student::Model::create(&app.db, external_id, name, "10A", "10")
        .await
        .unwrap();
}

#[tokio::test]
#[serial]
async fn create_session_returns_scannable_payload() {
    AppConfig::set_qr_default_duration_minutes(30);
    let app = make_test_app().await;

    let data = maths(&app).await;

    let code = data["session_code"].as_str().unwrap();
    assert_eq!(code.len(), 32);
    assert_eq!(data["active"], true);

    let created = DateTime::parse_from_rfc3339(data["created_at"].as_str().unwrap()).unwrap();
    let expires = DateTime::parse_from_rfc3339(data["expires_at"].as_str().unwrap()).unwrap();
    assert_eq!(expires - created, Duration::minutes(30));

    let token: Value = serde_json::from_str(data["qr_data"].as_str().unwrap()).unwrap();
    assert_eq!(token["session_code"], code);
    assert_eq!(token["subject"], "Mathematics");
    assert_eq!(token["expires_at"], expires.timestamp());

    AppConfig::reset();
}

#[tokio::test]
#[serial]
async fn create_session_honours_configured_default_duration() {
    AppConfig::set_qr_default_duration_minutes(90);
    let app = make_test_app().await;

    let data = maths(&app).await;

    let created = DateTime::parse_from_rfc3339(data["created_at"].as_str().unwrap()).unwrap();
    let expires = DateTime::parse_from_rfc3339(data["expires_at"].as_str().unwrap()).unwrap();
    assert_eq!(expires - created, Duration::minutes(90));

    AppConfig::reset();
}

#[tokio::test]
async fn create_session_validates_input() {
    let app = make_test_app().await;

    let cases = [
        json!({"subject": "  ", "issuer": "Mr. Smith"}),
        json!({"subject": "Mathematics", "issuer": ""}),
        json!({"issuer": "Mr. Smith"}),
        json!({"subject": "Mathematics"}),
        json!({"subject": "Mathematics", "issuer": "Mr. Smith", "duration": 0}),
        json!({"subject": "Mathematics", "issuer": "Mr. Smith", "duration": -10}),
        json!({"subject": "Mathematics", "issuer": "Mr. Smith", "duration": i64::MAX}),
    ];
    for body in cases {
        let (status, json) = send_json(&app, "POST", "/api/qr/sessions", Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(json["success"], false);
    }
}

#[tokio::test]
async fn list_shows_only_active_sessions() {
    let app = make_test_app().await;
    let first = maths(&app).await;
    let second = maths(&app).await;
    let code = first["session_code"].as_str().unwrap();

    let (status, _) = send_json(
        &app,
        "PUT",
        &format!("/api/qr/sessions/{code}/deactivate"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send_json(&app, "GET", "/api/qr/sessions", None).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["session_code"].as_str().unwrap())
        .collect();
    assert_eq!(listed, vec![second["session_code"].as_str().unwrap()]);
}

#[tokio::test]
async fn deactivate_is_idempotent_and_unknown_is_not_found() {
    let app = make_test_app().await;
    let data = maths(&app).await;
    let uri = format!(
        "/api/qr/sessions/{}/deactivate",
        data["session_code"].as_str().unwrap()
    );

    for _ in 0..2 {
        let (status, json) = send_json(&app, "PUT", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "QR session deactivated");
    }

    let (status, _) = send_json(&app, "PUT", "/api/qr/sessions/nope/deactivate", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn scan_records_once_then_reports_duplicate() {
    let app = make_test_app().await;
    add_student(&app, "S001", "Alice").await;
    let data = maths(&app).await;
    let qr = data["qr_data"].as_str().unwrap();

    let (status, json) = scan(&app, qr, "S001").await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["student_name"], "Alice");
    assert_eq!(json["data"]["student_id"], "S001");
    assert_eq!(json["data"]["subject"], "Mathematics");
    assert_eq!(json["data"]["issuer"], "Mr. Smith");
    assert_eq!(json["data"]["location"], "Room 12");

    let (status, json) = scan(&app, qr, "S001").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["success"], false);
    assert_eq!(json["data"]["code"], "duplicate_scan");
    assert_eq!(json["data"]["retryable"], false);
}

#[tokio::test]
async fn scan_rejections_map_to_distinct_statuses() {
    let app = make_test_app().await;
    add_student(&app, "S001", "Alice").await;
    let data = maths(&app).await;
    let code = data["session_code"].as_str().unwrap();
    let qr = data["qr_data"].as_str().unwrap();

    let (status, json) = scan(&app, "not a qr payload", "S001").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["data"]["code"], "invalid_token");

    let stale = json!({
        "session_code": code,
        "subject": "Mathematics",
        "issuer": "Mr. Smith",
        "location": "Room 12",
        "expires_at": (Utc::now() - Duration::minutes(1)).timestamp(),
    })
    .to_string();
    let (status, json) = scan(&app, &stale, "S001").await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(json["data"]["code"], "expired");

    let (status, json) = scan(&app, qr, "S999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["data"]["code"], "holder_not_found");

    send_json(
        &app,
        "PUT",
        &format!("/api/qr/sessions/{code}/deactivate"),
        None,
    )
    .await;
    let (status, json) = scan(&app, qr, "S001").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["data"]["code"], "session_inactive");
}

#[tokio::test]
async fn report_lists_scans_with_student_details() {
    let app = make_test_app().await;
    add_student(&app, "S001", "Alice").await;
    add_student(&app, "S002", "Bob").await;
    let data = maths(&app).await;
    let code = data["session_code"].as_str().unwrap();
    let qr = data["qr_data"].as_str().unwrap();

    scan(&app, qr, "S001").await;
    scan(&app, qr, "S002").await;
    scan(&app, qr, "S001").await;

    let (status, json) =
        send_json(&app, "GET", &format!("/api/qr/sessions/{code}/report"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 2);
    assert_eq!(json["data"]["session"]["session_code"], code);

    let names: Vec<&str> = json["data"]["scans"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["student_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Alice", "Bob"]);

    let (status, _) = send_json(&app, "GET", "/api/qr/sessions/nope/report", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
