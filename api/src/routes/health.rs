use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use serde::Serialize;
use util::state::AppState;

use crate::response::ApiResponse;

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

#[derive(Debug, Serialize, Default)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Live notification listeners; `None` when the hub is not running.
    pub listeners: Option<usize>,
}

/// GET /health
///
/// Always `200 OK` while the process serves requests.
///
/// ```json
/// {
///   "success": true,
///   "data": { "status": "OK", "listeners": 3 },
///   "message": "Health check passed"
/// }
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let listeners = state.hub().connection_count().await.ok();
    Json(ApiResponse::success(
        HealthResponse {
            status: "OK",
            listeners,
        },
        "Health check passed",
    ))
}
