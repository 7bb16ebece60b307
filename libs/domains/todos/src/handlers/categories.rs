use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_helpers::{ErrorResponse, Principal, UuidPath, ValidatedJson, ValidatedQuery};

use super::{CategoryState, TAG_CATEGORIES};
use crate::error::TodoResult;
use crate::models::{Category, CreateCategory, Page, PageQuery, UpdateCategory};
use crate::repository::CategoryRepository;

/// List categories by name
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = TAG_CATEGORIES,
    params(PageQuery),
    responses(
        (status = 200, description = "Page of categories", body = Page<Category>),
        (status = 400, description = "Invalid query", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_categories<C: CategoryRepository>(
    State(service): CategoryState<C>,
    principal: Principal,
    ValidatedQuery(page): ValidatedQuery<PageQuery>,
) -> TodoResult<Json<Page<Category>>> {
    Ok(Json(
        service.list_categories(&principal.user_id, page).await?,
    ))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/categories",
    tag = TAG_CATEGORIES,
    request_body = CreateCategory,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 409, description = "Name already used", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn create_category<C: CategoryRepository>(
    State(service): CategoryState<C>,
    principal: Principal,
    ValidatedJson(input): ValidatedJson<CreateCategory>,
) -> TodoResult<impl IntoResponse> {
    let category = service.create_category(&principal.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Get a category
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    tag = TAG_CATEGORIES,
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category found", body = Category),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn get_category<C: CategoryRepository>(
    State(service): CategoryState<C>,
    principal: Principal,
    UuidPath(id): UuidPath,
) -> TodoResult<Json<Category>> {
    Ok(Json(service.get_category(&principal.user_id, id).await?))
}

/// Partially update a category
#[utoipa::path(
    patch,
    path = "/api/categories/{id}",
    tag = TAG_CATEGORIES,
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategory,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 404, description = "Category not found", body = ErrorResponse),
        (status = 409, description = "Name already used", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn update_category<C: CategoryRepository>(
    State(service): CategoryState<C>,
    principal: Principal,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateCategory>,
) -> TodoResult<Json<Category>> {
    let category = service
        .update_category(&principal.user_id, id, input)
        .await?;
    Ok(Json(category))
}

/// Delete a category; its todos keep existing without one
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    tag = TAG_CATEGORIES,
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn delete_category<C: CategoryRepository>(
    State(service): CategoryState<C>,
    principal: Principal,
    UuidPath(id): UuidPath,
) -> TodoResult<StatusCode> {
    service.delete_category(&principal.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
