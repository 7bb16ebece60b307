use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_helpers::{ErrorResponse, Principal, UuidPath, ValidatedJson, ValidatedQuery};

use super::{TAG_TODOS, TodoState};
use crate::error::TodoResult;
use crate::models::{CreateTodo, Page, PopulatedTodo, Todo, TodoFilter, TodoStats, UpdateTodo};
use crate::repository::{CategoryRepository, TodoRepository};

/// List todos
#[utoipa::path(
    get,
    path = "/api/todos",
    tag = TAG_TODOS,
    params(TodoFilter),
    responses(
        (status = 200, description = "Page of todos", body = Page<Todo>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_todos<R: TodoRepository, C: CategoryRepository>(
    State(service): TodoState<R, C>,
    principal: Principal,
    ValidatedQuery(filter): ValidatedQuery<TodoFilter>,
) -> TodoResult<Json<Page<Todo>>> {
    let page = service.list_todos(&principal.user_id, filter).await?;
    Ok(Json(page))
}

/// Create a todo
#[utoipa::path(
    post,
    path = "/api/todos",
    tag = TAG_TODOS,
    request_body = CreateTodo,
    responses(
        (status = 201, description = "Todo created", body = Todo),
        (status = 400, description = "Validation failed or parent is a subtask", body = ErrorResponse),
        (status = 404, description = "Parent or category not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn create_todo<R: TodoRepository, C: CategoryRepository>(
    State(service): TodoState<R, C>,
    principal: Principal,
    ValidatedJson(input): ValidatedJson<CreateTodo>,
) -> TodoResult<impl IntoResponse> {
    let todo = service.create_todo(&principal.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

/// Counts of the caller's todos
#[utoipa::path(
    get,
    path = "/api/todos/stats",
    tag = TAG_TODOS,
    responses(
        (status = 200, description = "Todo statistics", body = TodoStats),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn todo_stats<R: TodoRepository, C: CategoryRepository>(
    State(service): TodoState<R, C>,
    principal: Principal,
) -> TodoResult<Json<TodoStats>> {
    Ok(Json(service.stats(&principal.user_id).await?))
}

/// Get a todo with its category, subtasks, comments and attachments
#[utoipa::path(
    get,
    path = "/api/todos/{id}",
    tag = TAG_TODOS,
    params(("id" = Uuid, Path, description = "Todo ID")),
    responses(
        (status = 200, description = "Todo found", body = PopulatedTodo),
        (status = 400, description = "Invalid UUID", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn get_todo<R: TodoRepository, C: CategoryRepository>(
    State(service): TodoState<R, C>,
    principal: Principal,
    UuidPath(id): UuidPath,
) -> TodoResult<Json<PopulatedTodo>> {
    let todo = service.get_todo(&principal.user_id, id).await?;
    Ok(Json(todo))
}

/// Partially update a todo
#[utoipa::path(
    patch,
    path = "/api/todos/{id}",
    tag = TAG_TODOS,
    params(("id" = Uuid, Path, description = "Todo ID")),
    request_body = UpdateTodo,
    responses(
        (status = 200, description = "Todo updated", body = Todo),
        (status = 400, description = "Validation failed or invalid parent", body = ErrorResponse),
        (status = 404, description = "Todo, parent or category not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn update_todo<R: TodoRepository, C: CategoryRepository>(
    State(service): TodoState<R, C>,
    principal: Principal,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateTodo>,
) -> TodoResult<Json<Todo>> {
    let todo = service.update_todo(&principal.user_id, id, input).await?;
    Ok(Json(todo))
}

/// Delete a todo with its subtasks, comments and attachments
#[utoipa::path(
    delete,
    path = "/api/todos/{id}",
    tag = TAG_TODOS,
    params(("id" = Uuid, Path, description = "Todo ID")),
    responses(
        (status = 204, description = "Todo deleted"),
        (status = 404, description = "Todo not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn delete_todo<R: TodoRepository, C: CategoryRepository>(
    State(service): TodoState<R, C>,
    principal: Principal,
    UuidPath(id): UuidPath,
) -> TodoResult<StatusCode> {
    service.delete_todo(&principal.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
