use axum::response::{IntoResponse, Response};

use super::AppError;

/// Router fallback for unknown paths.
pub async fn not_found() -> Response {
    AppError::NotFound("The requested route does not exist".to_string()).into_response()
}
