use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, ErrorCode};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum TodoError {
    /// Missing, or owned by another principal. The two are deliberately
    /// indistinguishable.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("parent todo cannot have children")]
    CannotHaveChildren,

    #[error("invalid parent: {0}")]
    InvalidParent(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("object store error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type TodoResult<T> = Result<T, TodoError>;

impl TodoError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        TodoError::NotFound { entity, id }
    }

    pub fn todo_not_found(id: Uuid) -> Self {
        Self::not_found("todo", id)
    }
}

impl From<TodoError> for AppError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::NotFound { entity, .. } => AppError::NotFound(format!("{entity} not found")),
            TodoError::CannotHaveChildren => AppError::Rule {
                code: ErrorCode::CannotHaveChildren,
                message: ErrorCode::CannotHaveChildren.default_message().to_string(),
            },
            TodoError::InvalidParent(msg) | TodoError::InvalidInput(msg) => {
                AppError::BadRequest(msg)
            }
            TodoError::Validation(errors) => AppError::Validation(errors),
            TodoError::Conflict(msg) => AppError::Conflict(msg),
            TodoError::Storage(msg) => AppError::InternalServerError(format!("storage: {msg}")),
            TodoError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Store errors collapse into the domain taxonomy here; the driver's text is
/// only kept for `Internal`, which never reaches the wire.
impl From<DbErr> for TodoError {
    fn from(err: DbErr) -> Self {
        if let DbErr::RecordNotFound(_) = &err {
            return TodoError::not_found("record", Uuid::nil());
        }
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                TodoError::Conflict("a record with the same name already exists".to_string())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                TodoError::InvalidInput("referenced record does not exist".to_string())
            }
            _ if is_not_null_violation(&err) => {
                TodoError::InvalidInput("a required field is missing".to_string())
            }
            _ => TodoError::Internal(err.to_string()),
        }
    }
}

// Postgres SQLSTATE 23502
fn is_not_null_violation(err: &DbErr) -> bool {
    let text = err.to_string();
    text.contains("23502") || text.contains("violates not-null constraint")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_cannot_have_children_maps_to_rule_code() {
        let app: AppError = TodoError::CannotHaveChildren.into();
        assert_eq!(app.code(), ErrorCode::CannotHaveChildren);
        assert_eq!(app.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_hides_identifier() {
        let id = Uuid::now_v7();
        let app: AppError = TodoError::todo_not_found(id).into();
        assert_eq!(app.status(), StatusCode::NOT_FOUND);
        assert!(!app.to_error_response().message.contains(&id.to_string()));
    }

    #[test]
    fn test_internal_details_do_not_reach_the_body() {
        let err: TodoError = DbErr::Custom("connection reset by peer".into()).into();
        assert!(matches!(err, TodoError::Internal(_)));
        let app: AppError = err.into();
        assert_eq!(app.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!app.to_error_response().message.contains("connection reset"));
    }

    #[test]
    fn test_record_not_found_maps_to_not_found() {
        let err: TodoError = DbErr::RecordNotFound("todos".into()).into();
        assert!(matches!(err, TodoError::NotFound { .. }));
    }

    #[test]
    fn test_not_null_violation_is_client_error() {
        let err: TodoError = DbErr::Custom(
            "null value in column \"title\" violates not-null constraint".into(),
        )
        .into();
        assert!(matches!(err, TodoError::InvalidInput(_)));
    }
}
