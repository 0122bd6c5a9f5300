use std::sync::Arc;

use axum::http::StatusCode;
use db::{
    AttendanceRepository,
    store::{AttendanceStore, QrSession, ScanReportRow, StoreError},
};
use serde::{Deserialize, Serialize};
use services::{
    scan_validator::{ScanAccepted, ScanRejection},
    session_registry::RegistryError,
};
use util::state::AppState;

pub(super) fn store(state: &AppState) -> Arc<dyn AttendanceStore> {
    Arc::new(AttendanceRepository::new(state.db_clone()))
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionReq {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub location: String,
    /// Minutes; defaults to `QR_DEFAULT_DURATION_MINUTES`.
    pub duration: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitScanReq {
    pub qr_data: String,
    pub student_id: String,
    pub location: Option<String>,
}

#[derive(Debug, Serialize, Default)]
pub struct QrSessionResponse {
    pub id: i64,
    pub session_code: String,
    pub subject: String,
    pub issuer: String,
    pub location: String,
    pub expires_at: String,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<QrSession> for QrSessionResponse {
    fn from(m: QrSession) -> Self {
        Self {
            id: m.id,
            session_code: m.session_code,
            subject: m.subject,
            issuer: m.issuer,
            location: m.location,
            expires_at: m.expires_at.to_rfc3339(),
            active: m.active,
            created_at: m.created_at.to_rfc3339(),
            updated_at: m.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct CreatedSessionResponse {
    #[serde(flatten)]
    pub session: QrSessionResponse,
    /// Text to render into the QR image.
    pub qr_data: String,
}

#[derive(Debug, Serialize, Default)]
pub struct SessionReportResponse {
    pub session: QrSessionResponse,
    pub scans: Vec<ScanReportRow>,
    pub total: usize,
}

#[derive(Debug, Serialize, Default)]
pub struct ScanResponse {
    pub session_code: String,
    pub student_id: String,
    pub student_name: String,
    pub subject: String,
    pub issuer: String,
    pub scan_time: String,
    pub location: String,
}

impl ScanResponse {
    pub fn new(accepted: ScanAccepted, student_id: &str) -> Self {
        Self {
            session_code: accepted.record.session_code,
            student_id: student_id.trim().to_owned(),
            student_name: accepted.student_name,
            subject: accepted.subject,
            issuer: accepted.issuer,
            scan_time: accepted.record.scan_time.to_rfc3339(),
            location: accepted.record.location,
        }
    }
}

/// `data` of a scan response: the recorded scan or the rejection reason.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ScanOutcome {
    Recorded(ScanResponse),
    Rejected(ScanFailure),
}

/// Data carried by a rejected scan.
#[derive(Debug, Serialize, Default)]
pub struct ScanFailure {
    pub code: &'static str,
    pub retryable: bool,
}

impl From<&ScanRejection> for ScanFailure {
    fn from(r: &ScanRejection) -> Self {
        Self {
            code: r.code(),
            retryable: r.is_retryable(),
        }
    }
}

pub(super) fn rejection_status(r: &ScanRejection) -> StatusCode {
    match r {
        ScanRejection::InvalidToken(_) => StatusCode::BAD_REQUEST,
        ScanRejection::Expired => StatusCode::GONE,
        ScanRejection::SessionInactive | ScanRejection::HolderNotFound => StatusCode::NOT_FOUND,
        ScanRejection::DuplicateScan => StatusCode::CONFLICT,
        ScanRejection::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub(super) fn registry_status(e: &RegistryError) -> StatusCode {
    match e {
        RegistryError::InvalidDuration => StatusCode::BAD_REQUEST,
        RegistryError::CodeSpaceExhausted => StatusCode::SERVICE_UNAVAILABLE,
        RegistryError::Store(e) => store_status(e),
    }
}

pub(super) fn store_status(e: &StoreError) -> StatusCode {
    match e {
        StoreError::Conflict => StatusCode::CONFLICT,
        StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
