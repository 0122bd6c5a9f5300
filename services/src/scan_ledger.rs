use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use db::store::{AttendanceStore, NewScan, ScanInsert, ScanRecord, ScanReportRow, StoreError};

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerOutcome {
    Recorded(ScanRecord),
    AlreadyRecorded,
}

/// One scan per (session, student). The store's key enforces it, so the
/// guarantee holds across tasks and across processes sharing the database.
#[derive(Clone)]
pub struct ScanLedger {
    store: Arc<dyn AttendanceStore>,
}

impl ScanLedger {
    pub fn new(store: Arc<dyn AttendanceStore>) -> Self {
        Self { store }
    }

    pub async fn try_record(
        &self,
        session_code: &str,
        student_id: i64,
        scan_time: DateTime<Utc>,
        location: &str,
    ) -> Result<LedgerOutcome, StoreError> {
        let outcome = self
            .store
            .insert_scan_if_absent(NewScan {
                session_code: session_code.to_owned(),
                student_id,
                scan_time,
                location: location.to_owned(),
            })
            .await?;

        Ok(match outcome {
            ScanInsert::Inserted(record) => LedgerOutcome::Recorded(record),
            ScanInsert::AlreadyExists => {
                debug!(session_code, student_id, "scan already in ledger");
                LedgerOutcome::AlreadyRecorded
            }
        })
    }

    /// Scans for a session with student details, oldest first.
    pub async fn records_for(&self, session_code: &str) -> Result<Vec<ScanReportRow>, StoreError> {
        self.store.scans_for_session(session_code).await
    }
}
