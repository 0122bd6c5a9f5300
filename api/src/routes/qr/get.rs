use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use services::{scan_ledger::ScanLedger, session_registry::SessionRegistry};
use util::state::AppState;

use super::common::{QrSessionResponse, SessionReportResponse, store, store_status};
use crate::response::ApiResponse;

/// GET /api/qr/sessions
///
/// Sessions that are active and not yet expired, newest first.
pub async fn list_sessions(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<Vec<QrSessionResponse>>>) {
    let registry = SessionRegistry::new(store(&state));

    match registry.list_active(Utc::now()).await {
        Ok(sessions) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                sessions.into_iter().map(QrSessionResponse::from).collect(),
                "Active QR sessions retrieved",
            )),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list QR sessions");
            (
                store_status(&e),
                Json(ApiResponse::error("Failed to retrieve QR sessions")),
            )
        }
    }
}

/// GET /api/qr/sessions/{code}/report
///
/// The session plus every scan recorded against it, oldest first.
///
/// ### Responses
/// - `200 OK` with `{ session, scans, total }`
/// - `404 Not Found` for an unknown code
/// - `503 Service Unavailable` when the store cannot be read
pub async fn session_report(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> (StatusCode, Json<ApiResponse<SessionReportResponse>>) {
    let store = store(&state);

    let session = match SessionRegistry::new(store.clone()).find(&code).await {
        Ok(Some(session)) => session,
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
                Json(ApiResponse::error("Failed to load QR session")),
            );
        }
    };

    match ScanLedger::new(store).records_for(&code).await {
        Ok(scans) => {
            let total = scans.len();
            (
                StatusCode::OK,
                Json(ApiResponse::success(
                    SessionReportResponse {
                        session: session.into(),
                        scans,
                        total,
                    },
                    "Attendance report retrieved",
                )),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, code = %code, "Failed to load session scans");
            (
                store_status(&e),
                Json(ApiResponse::error("Failed to load attendance report")),
            )
        }
    }
}
