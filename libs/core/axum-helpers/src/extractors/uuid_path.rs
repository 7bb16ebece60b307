use crate::errors::{AppError, ErrorCode};
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use uuid::Uuid;

/// Parses every path parameter as a UUID, in route order.
///
/// ```ignore
/// async fn get_todo(UuidPath(id): UuidPath) -> ... { }
/// ```
///
/// For routes with two parameters use [`UuidPath2`].
pub struct UuidPath(pub Uuid);

/// Two UUID path parameters, e.g. `/todos/{id}/comments/{comment_id}`.
pub struct UuidPath2(pub Uuid, pub Uuid);

fn parse(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Rule {
        code: ErrorCode::InvalidUuid,
        message: format!("Invalid UUID: {raw}"),
    })
}

async fn raw_params<S: Send + Sync>(parts: &mut Parts, state: &S) -> Result<Vec<String>, AppError> {
    let Path(params) = Path::<Vec<(String, String)>>::from_request_parts(parts, state)
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?;
    Ok(params.into_iter().map(|(_, value)| value).collect())
}

impl<S> FromRequestParts<S> for UuidPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = raw_params(parts, state).await?;
        match params.as_slice() {
            [id] => Ok(UuidPath(parse(id)?)),
            _ => Err(AppError::InternalServerError(format!(
                "UuidPath expects one path parameter, route has {}",
                params.len()
            ))),
        }
    }
}

impl<S> FromRequestParts<S> for UuidPath2
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let params = raw_params(parts, state).await?;
        match params.as_slice() {
            [first, second] => Ok(UuidPath2(parse(first)?, parse(second)?)),
            _ => Err(AppError::InternalServerError(format!(
                "UuidPath2 expects two path parameters, route has {}",
                params.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    async fn one(UuidPath(id): UuidPath) -> String {
        id.to_string()
    }

    async fn two(UuidPath2(a, b): UuidPath2) -> String {
        format!("{a}/{b}")
    }

    fn app() -> Router {
        Router::new()
            .route("/todos/{id}", get(one))
            .route("/todos/{id}/comments/{comment_id}", get(two))
    }

    #[tokio::test]
    async fn test_valid_uuid() {
        let id = Uuid::now_v7();
        let response = app()
            .oneshot(Request::get(format!("/todos/{id}")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_invalid_uuid_is_bad_request() {
        let response = app()
            .oneshot(Request::get("/todos/not-a-uuid").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_two_params() {
        let (a, b) = (Uuid::now_v7(), Uuid::now_v7());
        let response = app()
            .oneshot(
                Request::get(format!("/todos/{a}/comments/{b}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }
}
