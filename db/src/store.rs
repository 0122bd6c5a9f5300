//! Persistence contract consumed by the QR attendance core.
//!
//! Every mutating method is a single statement against the database, so the
//! guarantees hold across tasks and across backend instances sharing a store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DbErr, FromQueryResult, SqlErr};
use serde::Serialize;
use thiserror::Error;

use crate::models::{qr_scan, qr_session, student};

pub use qr_scan::Model as ScanRecord;
pub use qr_session::Model as QrSession;
pub use student::Model as StudentRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("record conflicts with an existing row")]
    Conflict,
    /// The backing store failed; the operation may succeed if retried.
    #[error("store unavailable: {0}")]
    Unavailable(DbErr),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::Conflict,
            _ => StoreError::Unavailable(err),
        }
    }
}

/// Fields of a session about to be persisted.
#[derive(Debug, Clone)]
pub struct NewQrSession {
    pub session_code: String,
    pub subject: String,
    pub issuer: String,
    pub location: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewScan {
    pub session_code: String,
    pub student_id: i64,
    pub scan_time: DateTime<Utc>,
    pub location: String,
}

/// Result of a conditional insert on the scan ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanInsert {
    Inserted(ScanRecord),
    AlreadyExists,
}

/// One line of a session attendance report.
#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct ScanReportRow {
    pub session_code: String,
    pub student_id: i64,
    pub external_student_id: String,
    pub student_name: String,
    pub class: String,
    pub grade: String,
    pub scan_time: DateTime<Utc>,
    pub location: String,
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Inserts a session. `StoreError::Conflict` when the code is taken.
    async fn create_session(&self, session: NewQrSession) -> Result<QrSession, StoreError>;

    async fn get_session(&self, code: &str) -> Result<Option<QrSession>, StoreError>;

    /// Flips `active` to false. Returns whether a row changed; unknown and
    /// already inactive codes return `false`.
    async fn deactivate_session(&self, code: &str, at: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Active, unexpired sessions, newest first.
    async fn list_active_sessions(&self, now: DateTime<Utc>) -> Result<Vec<QrSession>, StoreError>;

    /// Atomic insert-unless-present on `(session_code, student_id)`.
    async fn insert_scan_if_absent(&self, scan: NewScan) -> Result<ScanInsert, StoreError>;

    /// Scans for a session joined with student details, by scan time.
    async fn scans_for_session(&self, code: &str) -> Result<Vec<ScanReportRow>, StoreError>;

    async fn find_student_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<StudentRecord>, StoreError>;

    async fn has_guardian(&self, student_id: i64) -> Result<bool, StoreError>;
}
