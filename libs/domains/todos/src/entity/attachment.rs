use crate::models::{Attachment, Base, NewAttachment};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "todo_attachments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub todo_id: Uuid,
    pub user_id: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
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

impl From<Model> for Attachment {
    fn from(model: Model) -> Self {
        Self {
            base: super::base(model.id, model.created_at, model.updated_at),
            todo_id: model.todo_id,
            user_id: model.user_id,
            file_name: model.file_name,
            content_type: model.content_type,
            size_bytes: model.size_bytes,
            storage_key: model.storage_key,
        }
    }
}

impl From<(NewAttachment, &Base)> for ActiveModel {
    fn from((input, base): (NewAttachment, &Base)) -> Self {
        ActiveModel {
            id: Set(base.id),
            todo_id: Set(input.todo_id),
            user_id: Set(input.user_id),
            file_name: Set(input.file_name),
            content_type: Set(input.content_type),
            size_bytes: Set(input.size_bytes),
            storage_key: Set(input.storage_key),
            created_at: Set(super::tz(base.created_at)),
            updated_at: Set(super::tz(base.updated_at)),
        }
    }
}
