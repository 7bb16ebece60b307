use crate::models::{Base, Comment};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "todo_comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub todo_id: Uuid,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::todo::Entity",
        from = "Column::TodoId",
        to = "super::todo::Column::Id"
    )]
    Todo,
}

impl Related<super::todo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Todo.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Comment {
    fn from(model: Model) -> Self {
        Self {
            base: super::base(model.id, model.created_at, model.updated_at),
            todo_id: model.todo_id,
            user_id: model.user_id,
            content: model.content,
        }
    }
}

impl ActiveModel {
    pub fn from_new(todo_id: Uuid, user_id: &str, content: String, base: &Base) -> Self {
        ActiveModel {
            id: Set(base.id),
            todo_id: Set(todo_id),
            user_id: Set(user_id.to_string()),
            content: Set(content),
            created_at: Set(super::tz(base.created_at)),
            updated_at: Set(super::tz(base.updated_at)),
        }
    }
}
