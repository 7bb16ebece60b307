use crate::models::{Base, NewTodo, Todo, TodoMetadata, TodoPriority, TodoStatus};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "todos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: TodoPriority,
    pub status: TodoStatus,
    pub due_date: Option<DateTimeWithTimeZone>,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub parent_todo_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub metadata: Option<Json>,
    pub sort_order: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "SetNull"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Todo {
    fn from(model: Model) -> Self {
        Self {
            base: super::base(model.id, model.created_at, model.updated_at),
            user_id: model.user_id,
            title: model.title,
            description: model.description,
            priority: model.priority,
            status: model.status,
            due_date: model.due_date.map(Into::into),
            completed_at: model.completed_at.map(Into::into),
            parent_todo_id: model.parent_todo_id,
            category_id: model.category_id,
            // Rows written by this crate always hold a valid document
            metadata: model
                .metadata
                .and_then(|value| serde_json::from_value::<TodoMetadata>(value).ok()),
            sort_order: model.sort_order,
        }
    }
}

fn metadata_json(metadata: Option<&TodoMetadata>) -> Option<Json> {
    metadata.and_then(|m| serde_json::to_value(m).ok())
}

impl ActiveModel {
    pub fn from_new(input: NewTodo, base: &Base) -> Self {
        ActiveModel {
            id: Set(base.id),
            metadata: Set(metadata_json(input.metadata.as_ref())),
            user_id: Set(input.user_id),
            title: Set(input.title),
            description: Set(input.description),
            priority: Set(input.priority),
            status: Set(input.status),
            due_date: Set(input.due_date.map(super::tz)),
            completed_at: Set(input.completed_at.map(super::tz)),
            parent_todo_id: Set(input.parent_todo_id),
            category_id: Set(input.category_id),
            sort_order: Set(input.sort_order),
            created_at: Set(super::tz(base.created_at)),
            updated_at: Set(super::tz(base.updated_at)),
        }
    }
}
