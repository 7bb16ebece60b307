use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_helpers::{ErrorResponse, Principal, UuidPath, UuidPath2, ValidatedJson, ValidatedQuery};

use super::{TAG_COMMENTS, TodoState};
use crate::error::TodoResult;
use crate::models::{Comment, CreateComment, Page, PageQuery, UpdateComment};
use crate::repository::{CategoryRepository, TodoRepository};

/// Comment on a todo
#[utoipa::path(
    post,
    path = "/api/todos/{id}/comments",
    tag = TAG_COMMENTS,
    params(("id" = Uuid, Path, description = "Todo ID")),
    request_body = CreateComment,
    responses(
        (status = 201, description = "Comment added", body = Comment),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn add_comment<R: TodoRepository, C: CategoryRepository>(
    State(service): TodoState<R, C>,
    principal: Principal,
    UuidPath(todo_id): UuidPath,
    ValidatedJson(input): ValidatedJson<CreateComment>,
) -> TodoResult<impl IntoResponse> {
    let comment = service
        .add_comment(&principal.user_id, todo_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Comments of a todo, oldest first
#[utoipa::path(
    get,
    path = "/api/todos/{id}/comments",
    tag = TAG_COMMENTS,
    params(("id" = Uuid, Path, description = "Todo ID"), PageQuery),
    responses(
        (status = 200, description = "Page of comments", body = Page<Comment>),
        (status = 404, description = "Todo not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_comments<R: TodoRepository, C: CategoryRepository>(
    State(service): TodoState<R, C>,
    principal: Principal,
    UuidPath(todo_id): UuidPath,
    ValidatedQuery(page): ValidatedQuery<PageQuery>,
) -> TodoResult<Json<Page<Comment>>> {
    let comments = service
        .list_comments(&principal.user_id, todo_id, page)
        .await?;
    Ok(Json(comments))
}

/// Edit a comment
#[utoipa::path(
    patch,
    path = "/api/todos/{id}/comments/{comment_id}",
    tag = TAG_COMMENTS,
    params(
        ("id" = Uuid, Path, description = "Todo ID"),
        ("comment_id" = Uuid, Path, description = "Comment ID")
    ),
    request_body = UpdateComment,
    responses(
        (status = 200, description = "Comment updated", body = Comment),
        (status = 404, description = "Todo or comment not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn update_comment<R: TodoRepository, C: CategoryRepository>(
    State(service): TodoState<R, C>,
    principal: Principal,
    UuidPath2(todo_id, comment_id): UuidPath2,
    ValidatedJson(input): ValidatedJson<UpdateComment>,
) -> TodoResult<Json<Comment>> {
    let comment = service
        .update_comment(&principal.user_id, todo_id, comment_id, input)
        .await?;
    Ok(Json(comment))
}

/// Delete a comment
#[utoipa::path(
    delete,
    path = "/api/todos/{id}/comments/{comment_id}",
    tag = TAG_COMMENTS,
    params(
        ("id" = Uuid, Path, description = "Todo ID"),
        ("comment_id" = Uuid, Path, description = "Comment ID")
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 404, description = "Todo or comment not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn delete_comment<R: TodoRepository, C: CategoryRepository>(
    State(service): TodoState<R, C>,
    principal: Principal,
    UuidPath2(todo_id, comment_id): UuidPath2,
) -> TodoResult<StatusCode> {
    service
        .delete_comment(&principal.user_id, todo_id, comment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
