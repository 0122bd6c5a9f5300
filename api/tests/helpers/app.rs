use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use db::test_utils::setup_test_db;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;
use util::{state::AppState, ws::NotificationHub};

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    pub hub: NotificationHub,
}

/// Router over a fresh in-memory database and its own hub.
pub async fn make_test_app() -> TestApp {
    let db = setup_test_db().await;
    let hub = NotificationHub::spawn(64);
    let router = api::app(AppState::new(db.clone(), hub.clone()));
    TestApp { router, db, hub }
}

/// Sends one request through the router and decodes the JSON body.
pub async fn send_json(
    app: &TestApp,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    let req = match body {
        Some(b) => req.body(Body::from(b.to_string())).unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
