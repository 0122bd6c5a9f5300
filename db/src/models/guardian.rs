use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "guardians")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone_number: Option<String>,
    pub relationship: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub async fn create(
        db: &DatabaseConnection,
        name: &str,
        email: &str,
        relationship: &str,
    ) -> Result<Self, DbErr> {
        ActiveModel {
            id: NotSet,
            name: Set(name.to_owned()),
            email: Set(email.to_owned()),
            phone_number: Set(None),
            relationship: Set(relationship.to_owned()),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
    }
}
