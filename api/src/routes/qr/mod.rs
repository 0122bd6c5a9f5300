//! `/api/qr` routes.
//!
//! - `POST /sessions` → create a session and its QR payload
//! - `GET /sessions` → list active sessions
//! - `PUT /sessions/{code}/deactivate` → stop accepting scans
//! - `GET /sessions/{code}/report` → scans recorded for a session
//! - `POST /scan` → redeem a scanned payload for a student

use axum::{
    Router,
    routing::{get, post, put},
};
use util::state::AppState;

mod common;
mod get;
mod post;
mod put;

pub use common::{
    CreateSessionReq, CreatedSessionResponse, QrSessionResponse, ScanFailure, ScanOutcome,
    ScanResponse, SessionReportResponse, SubmitScanReq,
};
pub use get::{list_sessions, session_report};
pub use post::{create_session, submit_scan};
pub use put::deactivate_session;

pub fn qr_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list_sessions).post(create_session))
        .route("/sessions/{code}/deactivate", put(deactivate_session))
        .route("/sessions/{code}/report", get(session_report))
        .route("/scan", post(submit_scan))
}
