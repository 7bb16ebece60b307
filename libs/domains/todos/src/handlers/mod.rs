//! HTTP surface of the todo domain. Every route expects a [`Principal`]
//! in the request extensions, normally put there by the JWT middleware.
//!
//! [`Principal`]: axum_helpers::Principal

pub mod attachments;
pub mod categories;
pub mod comments;
pub mod todos;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
};
use axum_helpers::{ErrorCode, ErrorResponse, FieldError};
use std::sync::Arc;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::models::{
    Attachment, Base, Category, Comment, CreateCategory, CreateComment, CreateTodo, DownloadUrl,
    PopulatedTodo, SortDirection, Todo, TodoMetadata, TodoPriority, TodoSort, TodoStats,
    TodoStatus, UpdateCategory, UpdateComment, UpdateTodo,
};
use crate::repository::{CategoryRepository, TodoRepository};
use crate::service::{CategoryService, TodoService};

pub const TAG_TODOS: &str = "Todos";
pub const TAG_CATEGORIES: &str = "Categories";
pub const TAG_COMMENTS: &str = "Comments";
pub const TAG_ATTACHMENTS: &str = "Attachments";

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub type TodoState<R, C> = State<Arc<TodoService<R, C>>>;
pub type CategoryState<C> = State<Arc<CategoryService<C>>>;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        todos::list_todos,
        todos::create_todo,
        todos::todo_stats,
        todos::get_todo,
        todos::update_todo,
        todos::delete_todo,
        comments::add_comment,
        comments::list_comments,
        comments::update_comment,
        comments::delete_comment,
        attachments::upload_attachment,
        attachments::download_attachment,
        attachments::delete_attachment,
        categories::list_categories,
        categories::create_category,
        categories::get_category,
        categories::update_category,
        categories::delete_category,
    ),
    components(schemas(
        Base,
        Todo,
        TodoMetadata,
        TodoPriority,
        TodoStatus,
        TodoSort,
        SortDirection,
        TodoStats,
        PopulatedTodo,
        CreateTodo,
        UpdateTodo,
        Category,
        CreateCategory,
        UpdateCategory,
        Comment,
        CreateComment,
        UpdateComment,
        Attachment,
        DownloadUrl,
        ErrorResponse,
        ErrorCode,
        FieldError,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = TAG_TODOS, description = "Todos and subtasks"),
        (name = TAG_COMMENTS, description = "Comments on todos"),
        (name = TAG_ATTACHMENTS, description = "Files attached to todos"),
        (name = TAG_CATEGORIES, description = "Per-user categories")
    )
)]
pub struct ApiDoc;

/// Routes for todos and their comments and attachments, relative to `/api/todos`.
pub fn todo_router<R, C>(service: TodoService<R, C>, max_upload_bytes: usize) -> Router
where
    R: TodoRepository + 'static,
    C: CategoryRepository + 'static,
{
    Router::new()
        .route(
            "/",
            get(todos::list_todos::<R, C>).post(todos::create_todo::<R, C>),
        )
        .route("/stats", get(todos::todo_stats::<R, C>))
        .route(
            "/{id}",
            get(todos::get_todo::<R, C>)
                .patch(todos::update_todo::<R, C>)
                .delete(todos::delete_todo::<R, C>),
        )
        .route(
            "/{id}/comments",
            get(comments::list_comments::<R, C>).post(comments::add_comment::<R, C>),
        )
        .route(
            "/{id}/comments/{comment_id}",
            axum::routing::patch(comments::update_comment::<R, C>)
                .delete(comments::delete_comment::<R, C>),
        )
        .route(
            "/{id}/attachments",
            post(attachments::upload_attachment::<R, C>)
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route(
            "/{id}/attachments/{attachment_id}",
            axum::routing::delete(attachments::delete_attachment::<R, C>),
        )
        .route(
            "/{id}/attachments/{attachment_id}/download",
            get(attachments::download_attachment::<R, C>),
        )
        .with_state(Arc::new(service))
}

/// Routes for categories, relative to `/api/categories`.
pub fn category_router<C>(service: CategoryService<C>) -> Router
where
    C: CategoryRepository + 'static,
{
    Router::new()
        .route(
            "/",
            get(categories::list_categories::<C>).post(categories::create_category::<C>),
        )
        .route(
            "/{id}",
            get(categories::get_category::<C>)
                .patch(categories::update_category::<C>)
                .delete(categories::delete_category::<C>),
        )
        .with_state(Arc::new(service))
}

/// Todos under `/todos` and categories under `/categories`.
pub fn router<R, C>(
    todos: TodoService<R, C>,
    categories: CategoryService<C>,
    max_upload_bytes: usize,
) -> Router
where
    R: TodoRepository + 'static,
    C: CategoryRepository + 'static,
{
    Router::new()
        .nest("/todos", todo_router(todos, max_upload_bytes))
        .nest("/categories", category_router(categories))
}
