use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250101_000000_create_categories::Categories;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(TodoPriority::Enum)
                    .values([TodoPriority::Low, TodoPriority::Medium, TodoPriority::High])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(TodoStatus::Enum)
                    .values([
                        TodoStatus::Draft,
                        TodoStatus::Active,
                        TodoStatus::Completed,
                        TodoStatus::Archived,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Todos::Table)
                    .if_not_exists()
                    .col(pk_uuid(Todos::Id))
                    .col(string_len(Todos::UserId, 255))
                    .col(string_len(Todos::Title, 255))
                    .col(string_len_null(Todos::Description, 1000))
                    .col(
                        ColumnDef::new(Todos::Priority)
                            .enumeration(
                                TodoPriority::Enum,
                                [TodoPriority::Low, TodoPriority::Medium, TodoPriority::High],
                            )
                            .not_null()
                            .default("medium"),
                    )
                    .col(
                        ColumnDef::new(Todos::Status)
                            .enumeration(
                                TodoStatus::Enum,
                                [
                                    TodoStatus::Draft,
                                    TodoStatus::Active,
                                    TodoStatus::Completed,
                                    TodoStatus::Archived,
                                ],
                            )
                            .not_null()
                            .default("active"),
                    )
                    .col(timestamp_with_time_zone_null(Todos::DueDate))
                    .col(timestamp_with_time_zone_null(Todos::CompletedAt))
                    .col(uuid_null(Todos::ParentTodoId))
                    .col(uuid_null(Todos::CategoryId))
                    .col(json_binary_null(Todos::Metadata))
                    .col(integer(Todos::SortOrder).default(0))
                    .col(
                        timestamp_with_time_zone(Todos::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Todos::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_todos_parent_todo_id")
                            .from(Todos::Table, Todos::ParentTodoId)
                            .to(Todos::Table, Todos::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_todos_category_id")
                            .from(Todos::Table, Todos::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_todos_user_id_updated_at")
                    .table(Todos::Table)
                    .col(Todos::UserId)
                    .col(Todos::UpdatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_todos_user_id_status")
                    .table(Todos::Table)
                    .col(Todos::UserId)
                    .col(Todos::Status)
                    .to_owned(),
            )
            .await?;

        // Scheduled jobs scan by due date
        manager
            .create_index(
                Index::create()
                    .name("idx_todos_due_date")
                    .table(Todos::Table)
                    .col(Todos::DueDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_todos_parent_todo_id")
                    .table(Todos::Table)
                    .col(Todos::ParentTodoId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_todos_category_id")
                    .table(Todos::Table)
                    .col(Todos::CategoryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Todos::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(TodoStatus::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(TodoPriority::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Todos {
    Table,
    Id,
    UserId,
    Title,
    Description,
    Priority,
    Status,
    DueDate,
    CompletedAt,
    ParentTodoId,
    CategoryId,
    Metadata,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TodoPriority {
    #[sea_orm(iden = "todo_priority")]
    Enum,
    #[sea_orm(iden = "low")]
    Low,
    #[sea_orm(iden = "medium")]
    Medium,
    #[sea_orm(iden = "high")]
    High,
}

#[derive(DeriveIden)]
enum TodoStatus {
    #[sea_orm(iden = "todo_status")]
    Enum,
    #[sea_orm(iden = "draft")]
    Draft,
    #[sea_orm(iden = "active")]
    Active,
    #[sea_orm(iden = "completed")]
    Completed,
    #[sea_orm(iden = "archived")]
    Archived,
}
