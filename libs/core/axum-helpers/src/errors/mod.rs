pub mod codes;
pub mod handlers;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// Body of every error response.
///
/// ```json
/// {
///   "code": "VALIDATION_ERROR",
///   "message": "Request validation failed",
///   "status": 400,
///   "errors": [{ "field": "title", "error": "must be between 1 and 255 characters" }]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
    pub status: u16,
    /// Present only for validation failures; lists every offending field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            error: error.into(),
        }
    }
}

/// The only error type that is serialized onto the wire.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Query string error: {0}")]
    QueryRejection(#[from] QueryRejection),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    /// A client error with a domain-specific code, e.g. `CANNOT_HAVE_CHILDREN`.
    #[error("{code}: {message}")]
    Rule { code: ErrorCode, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::JsonExtractorRejection(_) => ErrorCode::InvalidJson,
            AppError::QueryRejection(_) => ErrorCode::InvalidQuery,
            AppError::Validation(_) => ErrorCode::ValidationError,
            AppError::Database(DbErr::RecordNotFound(_)) => ErrorCode::NotFound,
            AppError::Database(_) => ErrorCode::InternalError,
            AppError::BadRequest(_) => ErrorCode::BadRequest,
            AppError::Rule { code, .. } => *code,
            AppError::Unauthorized(_) => ErrorCode::Unauthorized,
            AppError::Forbidden(_) => ErrorCode::Forbidden,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::PayloadTooLarge(_) => ErrorCode::PayloadTooLarge,
            AppError::InternalServerError(_) => ErrorCode::InternalError,
            AppError::ServiceUnavailable(_) => ErrorCode::ServiceUnavailable,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.code().status()
    }

    /// Builds the response body. Server-side details stay in the logs.
    pub fn to_error_response(&self) -> ErrorResponse {
        let code = self.code();
        let (message, errors) = match self {
            AppError::JsonExtractorRejection(e) => (e.body_text(), None),
            AppError::QueryRejection(e) => (e.body_text(), None),
            AppError::Validation(e) => (
                code.default_message().to_string(),
                Some(flatten_validation_errors(e)),
            ),
            AppError::BadRequest(msg)
            | AppError::Rule { message: msg, .. }
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::PayloadTooLarge(msg) => (msg.clone(), None),
            AppError::Database(_)
            | AppError::InternalServerError(_)
            | AppError::ServiceUnavailable(_) => (code.default_message().to_string(), None),
        };

        ErrorResponse {
            code,
            message,
            status: code.status().as_u16(),
            errors,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let status = code.status();

        if status.is_server_error() {
            tracing::error!(error_code = code.code(), error = %self, "request failed");
        } else if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            tracing::warn!(error_code = code.code(), error = %self, "request rejected");
        } else {
            tracing::info!(error_code = code.code(), error = %self, "request rejected");
        }

        (status, Json(self.to_error_response())).into_response()
    }
}

/// Flattens nested validator output into one entry per failed rule.
///
/// Nested structs become dotted paths (`metadata.tags`), list items get an
/// index (`items[2].name`). Field names are reported in camelCase to match
/// the JSON payloads.
pub fn flatten_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    collect_field_errors(None, errors, &mut out);
    out.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.error.cmp(&b.error)));
    out
}

fn collect_field_errors(prefix: Option<&str>, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let name = if field == "__all__" {
            String::new()
        } else {
            to_camel_case(field)
        };
        let path = match (prefix, name.is_empty()) {
            (Some(p), true) => p.to_string(),
            (Some(p), false) => format!("{p}.{name}"),
            (None, _) => name,
        };

        match kind {
            ValidationErrorsKind::Field(list) => {
                out.extend(list.iter().map(|e| FieldError::new(path.clone(), describe(e))));
            }
            ValidationErrorsKind::Struct(inner) => collect_field_errors(Some(&path), inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_field_errors(Some(&format!("{path}[{index}]")), inner, out);
                }
            }
        }
    }
}

fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    let param = |key: &str| error.params.get(key).map(|v| v.to_string());
    match error.code.as_ref() {
        "length" => match (param("min"), param("max"), param("equal")) {
            (_, _, Some(eq)) => format!("must be exactly {eq} characters"),
            (Some(min), Some(max), _) => format!("must be between {min} and {max} characters"),
            (Some(min), None, _) => format!("must be at least {min} characters"),
            (None, Some(max), _) => format!("must be at most {max} characters"),
            _ => "has an invalid length".to_string(),
        },
        "range" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("must be between {min} and {max}"),
            (Some(min), None) => format!("must be at least {min}"),
            (None, Some(max)) => format!("must be at most {max}"),
            _ => "is out of range".to_string(),
        },
        "required" => "is required".to_string(),
        "email" => "must be a valid email address".to_string(),
        "url" => "must be a valid URL".to_string(),
        other => format!("is invalid ({other})"),
    }
}

fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for ch in field.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use validator::Validate;

    #[derive(Validate)]
    struct Inner {
        #[validate(length(min = 1, max = 3))]
        tag_name: String,
    }

    #[derive(Validate)]
    struct Outer {
        #[validate(length(min = 1, max = 10))]
        title: String,
        #[validate(range(min = 0))]
        sort_order: i32,
        #[validate(nested)]
        metadata: Inner,
    }

    async fn body_of(response: Response) -> ErrorResponse {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_lists_every_field() {
        let value = Outer {
            title: String::new(),
            sort_order: -1,
            metadata: Inner {
                tag_name: "toolong".to_string(),
            },
        };
        let errors = value.validate().unwrap_err();

        let response = AppError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_of(response).await;
        assert_eq!(body.code, ErrorCode::ValidationError);
        assert_eq!(body.status, 400);
        let fields: Vec<_> = body
            .errors
            .unwrap()
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["metadata.tagName", "sortOrder", "title"]);
    }

    #[tokio::test]
    async fn test_rule_error_keeps_its_code() {
        let response = AppError::Rule {
            code: ErrorCode::CannotHaveChildren,
            message: "Parent todo cannot have children".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_of(response).await;
        assert_eq!(body.code, ErrorCode::CannotHaveChildren);
        assert!(body.errors.is_none());
    }

    #[tokio::test]
    async fn test_internal_details_are_not_leaked() {
        let response =
            AppError::Database(DbErr::Custom("relation \"todos\" does not exist".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(response).await;
        assert_eq!(body.code, ErrorCode::InternalError);
        assert!(!body.message.contains("relation"));
    }

    #[test]
    fn test_describe_length_bounds() {
        let mut error = ValidationError::new("length");
        error.add_param("min".into(), &1);
        error.add_param("max".into(), &255);
        assert_eq!(describe(&error), "must be between 1 and 255 characters");
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("parent_todo_id"), "parentTodoId");
        assert_eq!(to_camel_case("title"), "title");
    }
}
