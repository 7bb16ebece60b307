use crate::models::{Base, Category, CreateCategory};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub color: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::todo::Entity")]
    Todos,
}

impl Related<super::todo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Todos.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Category {
    fn from(model: Model) -> Self {
        Self {
            base: super::base(model.id, model.created_at, model.updated_at),
            user_id: model.user_id,
            name: model.name,
            color: model.color,
            description: model.description,
            icon: model.icon,
        }
    }
}

impl ActiveModel {
    pub fn from_create(user_id: &str, input: CreateCategory, base: &Base) -> Self {
        ActiveModel {
            id: Set(base.id),
            user_id: Set(user_id.to_string()),
            name: Set(input.name),
            color: Set(input.color),
            description: Set(input.description),
            icon: Set(input.icon),
            created_at: Set(super::tz(base.created_at)),
            updated_at: Set(super::tz(base.updated_at)),
        }
    }
}
