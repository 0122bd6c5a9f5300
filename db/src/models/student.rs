use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A student as known to the attendance core. Managed by the CRUD layer;
/// the scan protocol only resolves holders through it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    /// Internal identity; what scans are recorded against.
    #[sea_orm(primary_key)]
    pub id: i64,
    /// External student number printed on cards and typed into the app.
    #[sea_orm(unique)]
    pub student_id: String,
    pub name: String,
    pub class: String,
    pub grade: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        student_id: &str,
        name: &str,
        class: &str,
        grade: &str,
    ) -> Result<Self, DbErr> {
        let now = Utc::now();
        ActiveModel {
            id: NotSet,
            student_id: Set(student_id.to_owned()),
            name: Set(name.to_owned()),
            class: Set(class.to_owned()),
            grade: Set(grade.to_owned()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await
    }
}
