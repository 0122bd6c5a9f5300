use axum::{Json, extract::State, http::StatusCode};
use chrono::{Duration, Utc};
use services::{
    scan_token,
    scan_validator::{ScanValidator, SubmitScan},
    session_registry::{CreateQrSession, SessionRegistry},
};
use util::state::AppState;

use super::common::{
    CreateSessionReq, CreatedSessionResponse, ScanFailure, ScanOutcome, ScanResponse, SubmitScanReq,
    registry_status, rejection_status, store,
};
use crate::response::ApiResponse;

/// POST /api/qr/sessions
///
/// Opens a QR session and returns it with the payload to encode in the QR image.
///
/// ### Request Body
/// ```json
/// { "subject": "Mathematics", "issuer": "Mr. Smith", "location": "Room 12", "duration": 45 }
/// ```
/// `duration` is in minutes and optional.
///
/// ### Responses
/// - `201 Created`
/// - `400 Bad Request` for a missing subject/issuer or a non-positive duration
pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionReq>,
) -> (StatusCode, Json<ApiResponse<CreatedSessionResponse>>) {
    let subject = body.subject.trim();
    let issuer = body.issuer.trim();
    if subject.is_empty() || issuer.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Subject and issuer are required")),
        );
    }

    let duration = match body.duration {
        None => None,
        Some(minutes) => match Duration::try_minutes(minutes) {
            Some(d) => Some(d),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error("Duration is out of range")),
                );
            }
        },
    };

    let registry = SessionRegistry::from_config(store(&state));
    let params = CreateQrSession {
        subject: subject.to_owned(),
        issuer: issuer.to_owned(),
        location: body.location.trim().to_owned(),
        duration,
    };

    match registry.create(params, Utc::now()).await {
        Ok(session) => {
            let qr_data = scan_token::encode(&session);
            (
                StatusCode::CREATED,
                Json(ApiResponse::success(
                    CreatedSessionResponse {
                        session: session.into(),
                        qr_data,
                    },
                    "QR session created",
                )),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create QR session");
            (registry_status(&e), Json(ApiResponse::error(e.to_string())))
        }
    }
}

/// POST /api/qr/scan
///
/// Records attendance for the student named in the body.
///
/// ### Request Body
/// ```json
/// { "qr_data": "{\"session_code\":\"...\",...}", "student_id": "S001", "location": "Room 12" }
/// ```
///
/// ### Responses
/// - `200 OK` with the recorded scan
/// - `400` invalid payload, `410` expired, `404` inactive session or unknown
///   student, `409` already scanned, `503` store unavailable (retryable)
///
/// Rejections carry `{ "code": "...", "retryable": bool }` as data.
pub async fn submit_scan(
    State(state): State<AppState>,
    Json(body): Json<SubmitScanReq>,
) -> (StatusCode, Json<ApiResponse<ScanOutcome>>) {
    let validator = ScanValidator::new(store(&state), state.hub_clone());
    let student_id = body.student_id.clone();

    let req = SubmitScan {
        qr_data: body.qr_data,
        student_id: body.student_id,
        location: body.location,
    };

    match validator.submit(req, Utc::now()).await {
        Ok(accepted) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                ScanOutcome::Recorded(ScanResponse::new(accepted, &student_id)),
                "Attendance recorded successfully",
            )),
        ),
        Err(rejection) => {
            tracing::info!(student = %student_id, reason = rejection.code(), "Scan rejected");
            (
                rejection_status(&rejection),
                Json(ApiResponse::failure(
                    ScanOutcome::Rejected(ScanFailure::from(&rejection)),
                    rejection.to_string(),
                )),
            )
        }
    }
}
