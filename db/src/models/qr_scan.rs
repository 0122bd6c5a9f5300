use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One consumed (session, student) pair. The composite primary key is the
/// store-level guarantee that a pair is recorded at most once.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "qr_scans")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub session_code: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub student_id: i64,
    pub scan_time: DateTime<Utc>,
    /// As reported by the scanning device; not verified.
    pub location: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::qr_session::Entity",
        from = "Column::SessionCode",
        to = "super::qr_session::Column::SessionCode"
    )]
    Session,
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id"
    )]
    Student,
}

impl Related<super::qr_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
