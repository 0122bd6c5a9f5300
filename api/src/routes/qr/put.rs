use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use services::session_registry::SessionRegistry;
use util::state::AppState;

use super::common::{store, store_status};
use crate::response::ApiResponse;

/// PUT /api/qr/sessions/{code}/deactivate
///
/// Stops the session from accepting scans. Deactivating a session that is
/// already inactive succeeds; an unknown code is `404 Not Found`.
pub async fn deactivate_session(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> (StatusCode, Json<ApiResponse<()>>) {
    let registry = SessionRegistry::new(store(&state));

    match registry.find(&code).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("QR session not found")),
            );
        }
        Err(e) => {
            tracing::error!(error = %e, code = %code, "Failed to load QR session");
            return (
                store_status(&e),
                Json(ApiResponse::error("Failed to deactivate QR session")),
            );
        }
    }

    match registry.deactivate(&code, Utc::now()).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::success((), "QR session deactivated")),
        ),
        Err(e) => {
            tracing::error!(error = %e, code = %code, "Failed to deactivate QR session");
            (
                store_status(&e),
                Json(ApiResponse::error("Failed to deactivate QR session")),
            )
        }
    }
}
