use chrono::{DateTime, Utc};
use poem_openapi::Object;
use sea_orm::entity::prelude::*;
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Object)]
#[sea_orm(table_name = "app_users")]
#[oai(rename = "User")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl Related<super::AccessLog::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccessLog.def()
    }
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    AccessLog,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Self::AccessLog => Entity::has_many(super::AccessLog::Entity)
                .from(Column::Id)
                .to(super::AccessLog::Column::UserId)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
