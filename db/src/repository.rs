use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::models::{qr_scan, qr_session, student, student_guardian};
use crate::store::{
    AttendanceStore, NewQrSession, NewScan, QrSession, ScanInsert, ScanReportRow, StoreError,
    StudentRecord,
};

/// SeaORM-backed implementation of [`AttendanceStore`].
#[derive(Clone)]
pub struct AttendanceRepository {
    db: DatabaseConnection,
}

impl AttendanceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AttendanceStore for AttendanceRepository {
    async fn create_session(&self, session: NewQrSession) -> Result<QrSession, StoreError> {
        let active = qr_session::ActiveModel {
            session_code: Set(session.session_code),
            subject: Set(session.subject),
            issuer: Set(session.issuer),
            location: Set(session.location),
            expires_at: Set(session.expires_at),
            active: Set(true),
            created_at: Set(session.created_at),
            updated_at: Set(session.created_at),
            ..Default::default()
        };
        Ok(active.insert(&self.db).await?)
    }

    async fn get_session(&self, code: &str) -> Result<Option<QrSession>, StoreError> {
        Ok(qr_session::Entity::find()
            .filter(qr_session::Column::SessionCode.eq(code))
            .one(&self.db)
            .await?)
    }

    async fn deactivate_session(&self, code: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        // The `active = true` guard keeps the transition one-way.
        let res = qr_session::Entity::update_many()
            .col_expr(qr_session::Column::Active, Expr::value(false))
            .col_expr(qr_session::Column::UpdatedAt, Expr::value(at))
            .filter(qr_session::Column::SessionCode.eq(code))
            .filter(qr_session::Column::Active.eq(true))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    async fn list_active_sessions(&self, now: DateTime<Utc>) -> Result<Vec<QrSession>, StoreError> {
        Ok(qr_session::Entity::find()
            .filter(qr_session::Column::Active.eq(true))
            .filter(qr_session::Column::ExpiresAt.gt(now))
            .order_by_desc(qr_session::Column::CreatedAt)
            .order_by_desc(qr_session::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn insert_scan_if_absent(&self, scan: NewScan) -> Result<ScanInsert, StoreError> {
        let created_at = Utc::now();
        let record = qr_scan::Model {
            session_code: scan.session_code,
            student_id: scan.student_id,
            scan_time: scan.scan_time,
            location: scan.location,
            created_at,
        };
        let active = qr_scan::ActiveModel {
            session_code: Set(record.session_code.clone()),
            student_id: Set(record.student_id),
            scan_time: Set(record.scan_time),
            location: Set(record.location.clone()),
            created_at: Set(created_at),
        };

        // Single INSERT .. ON CONFLICT DO NOTHING: the key decides, not a prior read.
        let inserted = qr_scan::Entity::insert(active)
            .on_conflict(
                OnConflict::columns([qr_scan::Column::SessionCode, qr_scan::Column::StudentId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await;

        match inserted {
            Ok(0) | Err(DbErr::RecordNotInserted) => Ok(ScanInsert::AlreadyExists),
            Ok(_) => Ok(ScanInsert::Inserted(record)),
            Err(e) => match StoreError::from(e) {
                StoreError::Conflict => Ok(ScanInsert::AlreadyExists),
                other => Err(other),
            },
        }
    }

    async fn scans_for_session(&self, code: &str) -> Result<Vec<ScanReportRow>, StoreError> {
        Ok(qr_scan::Entity::find()
            .select_only()
            .column(qr_scan::Column::SessionCode)
            .column(qr_scan::Column::StudentId)
            .column_as(student::Column::StudentId, "external_student_id")
            .column_as(student::Column::Name, "student_name")
            .column_as(student::Column::Class, "class")
            .column_as(student::Column::Grade, "grade")
            .column(qr_scan::Column::ScanTime)
            .column(qr_scan::Column::Location)
            .join(JoinType::InnerJoin, qr_scan::Relation::Student.def())
            .filter(qr_scan::Column::SessionCode.eq(code))
            .order_by_asc(qr_scan::Column::ScanTime)
            .into_model::<ScanReportRow>()
            .all(&self.db)
            .await?)
    }

    async fn find_student_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<StudentRecord>, StoreError> {
        Ok(student::Entity::find()
            .filter(student::Column::StudentId.eq(external_id.trim()))
            .one(&self.db)
            .await?)
    }

    async fn has_guardian(&self, student_id: i64) -> Result<bool, StoreError> {
        let count = student_guardian::Entity::find()
            .filter(student_guardian::Column::StudentId.eq(student_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }
}
