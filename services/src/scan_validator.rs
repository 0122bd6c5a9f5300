//! Redeems a scanned QR token for one student.
//!
//! A submission moves through decode, token expiry, session lookup, holder
//! lookup and the ledger write, stopping at the first failing step. Only a
//! recorded scan produces notifications, and those are best-effort: once the
//! ledger has the row, attendance stands even if nobody hears about it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use db::store::{AttendanceStore, QrSession, ScanRecord, StoreError, StudentRecord};
use util::ws::NotificationHub;

use crate::notifications::{attendance_event, guardian_event};
use crate::scan_ledger::{LedgerOutcome, ScanLedger};
use crate::scan_token::{self, DecodeError};
use crate::session_registry::SessionRegistry;

#[derive(Debug, Clone, Default)]
pub struct SubmitScan {
    /// Raw payload read from the QR image.
    pub qr_data: String,
    /// External student number.
    pub student_id: String,
    /// Where the student says they are. Falls back to the session location.
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanAccepted {
    pub record: ScanRecord,
    pub student_name: String,
    pub subject: String,
    pub issuer: String,
}

#[derive(Debug, Error)]
pub enum ScanRejection {
    #[error("invalid QR code: {0}")]
    InvalidToken(#[from] DecodeError),
    #[error("QR code has expired")]
    Expired,
    #[error("QR session is not active")]
    SessionInactive,
    #[error("student not found")]
    HolderNotFound,
    #[error("attendance already recorded for this session")]
    DuplicateScan,
    #[error("attendance store unavailable")]
    StoreUnavailable(#[source] StoreError),
}

impl ScanRejection {
    /// Stable machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            ScanRejection::InvalidToken(_) => "invalid_token",
            ScanRejection::Expired => "expired",
            ScanRejection::SessionInactive => "session_inactive",
            ScanRejection::HolderNotFound => "holder_not_found",
            ScanRejection::DuplicateScan => "duplicate_scan",
            ScanRejection::StoreUnavailable(_) => "store_unavailable",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ScanRejection::StoreUnavailable(_))
    }
}

impl From<StoreError> for ScanRejection {
    fn from(err: StoreError) -> Self {
        ScanRejection::StoreUnavailable(err)
    }
}

#[derive(Clone)]
pub struct ScanValidator {
    store: Arc<dyn AttendanceStore>,
    registry: SessionRegistry,
    ledger: ScanLedger,
    hub: NotificationHub,
}

impl ScanValidator {
    pub fn new(store: Arc<dyn AttendanceStore>, hub: NotificationHub) -> Self {
        Self {
            registry: SessionRegistry::new(store.clone()),
            ledger: ScanLedger::new(store.clone()),
            store,
            hub,
        }
    }

    pub async fn submit(
        &self,
        req: SubmitScan,
        now: DateTime<Utc>,
    ) -> Result<ScanAccepted, ScanRejection> {
        let token = scan_token::decode(req.qr_data.as_bytes())?;

        // The token's own expiry is checked before touching the store.
        if token.is_expired(now) {
            return Err(ScanRejection::Expired);
        }

        let session = match self.registry.find(&token.session_code).await? {
            Some(session) if session.accepts_scans(now) => session,
            _ => return Err(ScanRejection::SessionInactive),
        };

        let student = self
            .store
            .find_student_by_external_id(&req.student_id)
            .await?
            .ok_or(ScanRejection::HolderNotFound)?;

        let location = req
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(session.location.as_str());

        let record = match self
            .ledger
            .try_record(&session.session_code, student.id, now, location)
            .await?
        {
            LedgerOutcome::Recorded(record) => record,
            LedgerOutcome::AlreadyRecorded => return Err(ScanRejection::DuplicateScan),
        };

        info!(
            code = %session.session_code,
            student = %student.student_id,
            "attendance recorded via QR"
        );

        self.notify(&student, &session, now).await;

        Ok(ScanAccepted {
            record,
            student_name: student.name,
            subject: session.subject,
            issuer: session.issuer,
        })
    }

    async fn notify(&self, student: &StudentRecord, session: &QrSession, at: DateTime<Utc>) {
        let event = attendance_event(&student.name, &session.subject, at);
        if let Err(e) = self.hub.publish(&event).await {
            warn!(error = %e, student = %student.student_id, "attendance notification dropped");
        }

        match self.store.has_guardian(student.id).await {
            Ok(true) => {
                let event = guardian_event(student.id, &student.name, &session.subject, at);
                if let Err(e) = self.hub.publish(&event).await {
                    warn!(error = %e, student = %student.student_id, "guardian notification dropped");
                }
            }
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, student = %student.student_id, "guardian lookup failed");
            }
        }
    }
}
