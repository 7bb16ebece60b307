use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use axum_helpers::{AppError, ErrorResponse, Principal, UuidPath, UuidPath2};
use utoipa::ToSchema;

use super::{TAG_ATTACHMENTS, TodoState};
use crate::models::{Attachment, DownloadUrl};
use crate::repository::{CategoryRepository, TodoRepository};

pub const FILE_FIELD: &str = "file";

/// Multipart body of an upload.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

/// Upload a file to a todo
#[utoipa::path(
    post,
    path = "/api/todos/{id}/attachments",
    tag = TAG_ATTACHMENTS,
    params(("id" = Uuid, Path, description = "Todo ID")),
    request_body(content_type = "multipart/form-data", content = UploadForm),
    responses(
        (status = 201, description = "Attachment stored", body = Attachment),
        (status = 400, description = "Missing or empty file field", body = ErrorResponse),
        (status = 404, description = "Todo not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn upload_attachment<R: TodoRepository, C: CategoryRepository>(
    State(service): TodoState<R, C>,
    principal: Principal,
    UuidPath(todo_id): UuidPath,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;

        let attachment = service
            .upload_attachment(&principal.user_id, todo_id, file_name, content_type, bytes)
            .await?;
        return Ok((StatusCode::CREATED, Json(attachment)));
    }

    Err(AppError::BadRequest(format!(
        "multipart field '{FILE_FIELD}' is required"
    )))
}

/// Presigned download link for an attachment
#[utoipa::path(
    get,
    path = "/api/todos/{id}/attachments/{attachment_id}/download",
    tag = TAG_ATTACHMENTS,
    params(
        ("id" = Uuid, Path, description = "Todo ID"),
        ("attachment_id" = Uuid, Path, description = "Attachment ID")
    ),
    responses(
        (status = 200, description = "Download link", body = DownloadUrl),
        (status = 404, description = "Todo or attachment not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn download_attachment<R: TodoRepository, C: CategoryRepository>(
    State(service): TodoState<R, C>,
    principal: Principal,
    UuidPath2(todo_id, attachment_id): UuidPath2,
) -> Result<Json<DownloadUrl>, AppError> {
    let link = service
        .download_url(&principal.user_id, todo_id, attachment_id)
        .await?;
    Ok(Json(link))
}

/// Delete an attachment
#[utoipa::path(
    delete,
    path = "/api/todos/{id}/attachments/{attachment_id}",
    tag = TAG_ATTACHMENTS,
    params(
        ("id" = Uuid, Path, description = "Todo ID"),
        ("attachment_id" = Uuid, Path, description = "Attachment ID")
    ),
    responses(
        (status = 204, description = "Attachment deleted"),
        (status = 404, description = "Todo or attachment not found", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn delete_attachment<R: TodoRepository, C: CategoryRepository>(
    State(service): TodoState<R, C>,
    principal: Principal,
    UuidPath2(todo_id, attachment_id): UuidPath2,
) -> Result<StatusCode, AppError> {
    service
        .delete_attachment(&principal.user_id, todo_id, attachment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
