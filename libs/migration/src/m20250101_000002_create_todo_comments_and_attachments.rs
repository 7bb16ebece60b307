use sea_orm_migration::{prelude::*, schema::*};

use crate::m20250101_000001_create_todos::Todos;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Rows are removed by the application before the todo itself, so the
        // foreign keys carry no ON DELETE action.
        manager
            .create_table(
                Table::create()
                    .table(TodoComments::Table)
                    .if_not_exists()
                    .col(pk_uuid(TodoComments::Id))
                    .col(uuid(TodoComments::TodoId))
                    .col(string_len(TodoComments::UserId, 255))
                    .col(string_len(TodoComments::Content, 1000))
                    .col(
                        timestamp_with_time_zone(TodoComments::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(TodoComments::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_todo_comments_todo_id")
                            .from(TodoComments::Table, TodoComments::TodoId)
                            .to(Todos::Table, Todos::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_todo_comments_todo_id")
                    .table(TodoComments::Table)
                    .col(TodoComments::TodoId)
                    .col(TodoComments::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TodoAttachments::Table)
                    .if_not_exists()
                    .col(pk_uuid(TodoAttachments::Id))
                    .col(uuid(TodoAttachments::TodoId))
                    .col(string_len(TodoAttachments::UserId, 255))
                    .col(string_len(TodoAttachments::FileName, 255))
                    .col(string_len(TodoAttachments::ContentType, 255))
                    .col(big_integer(TodoAttachments::SizeBytes))
                    .col(string_len(TodoAttachments::StorageKey, 512))
                    .col(
                        timestamp_with_time_zone(TodoAttachments::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(TodoAttachments::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_todo_attachments_todo_id")
                            .from(TodoAttachments::Table, TodoAttachments::TodoId)
                            .to(Todos::Table, Todos::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_todo_attachments_todo_id")
                    .table(TodoAttachments::Table)
                    .col(TodoAttachments::TodoId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TodoAttachments::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(TodoComments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TodoComments {
    Table,
    Id,
    TodoId,
    UserId,
    Content,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TodoAttachments {
    Table,
    Id,
    TodoId,
    UserId,
    FileName,
    ContentType,
    SizeBytes,
    StorageKey,
    CreatedAt,
    UpdatedAt,
}
