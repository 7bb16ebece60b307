use axum::{
    Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::header,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_helpers::{AppError, HealthCheckFuture, JwtVerifier, jwt_auth_middleware, run_health_checks};
use chrono::Utc;
use domain_todos::{
    CategoryService, LocalObjectStore, ObjectStore, PgCategoryRepository, PgTodoRepository,
    TodoService, handlers,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::context::AppContext;

/// Authenticated todo and category routes, to be nested under `/api`.
pub fn api(ctx: &AppContext) -> Router {
    let objects: Arc<dyn ObjectStore> = Arc::new(ctx.objects.clone());
    let todos = TodoService::new(
        PgTodoRepository::new(ctx.db.clone()),
        PgCategoryRepository::new(ctx.db.clone()),
        objects,
    )
    .with_download_ttl(chrono::Duration::seconds(
        ctx.config.object_store.presign_ttl_secs,
    ));
    let categories = CategoryService::new(PgCategoryRepository::new(ctx.db.clone()));

    let verifier = JwtVerifier::new(&ctx.config.jwt);
    handlers::router(todos, categories, ctx.config.max_upload_bytes)
        .layer(middleware::from_fn_with_state(verifier, jwt_auth_middleware))
}

async fn ready_handler(State(ctx): State<AppContext>) -> Response {
    let checks: Vec<(&str, HealthCheckFuture<'_>)> = vec![
        (
            "database",
            Box::pin(async {
                database::postgres::check_health(&ctx.db)
                    .await
                    .map_err(|e| e.to_string())
            }),
        ),
        (
            "redis",
            Box::pin(async {
                let mut redis = ctx.redis.clone();
                database::redis::check_health(&mut redis)
                    .await
                    .map_err(|e| e.to_string())
            }),
        ),
    ];

    run_health_checks(checks).await.into_response()
}

/// `GET /ready`: Postgres `SELECT 1` and Redis `PING`.
pub fn ready_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/ready", get(ready_handler))
        .with_state(ctx)
}

#[derive(Debug, Deserialize)]
struct SignedLink {
    expires: i64,
    signature: String,
}

async fn download_object(
    State(store): State<LocalObjectStore>,
    Path(key): Path<String>,
    query: Result<Query<SignedLink>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(link) = query?;
    if !store.verify(&key, link.expires, &link.signature, Utc::now()) {
        return Err(AppError::Forbidden("invalid or expired link".to_string()));
    }

    let bytes = store.read(&key).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (header::CACHE_CONTROL, "private, no-store"),
        ],
        bytes,
    )
        .into_response())
}

/// `GET /files/{*key}`: serves objects behind links signed by [`LocalObjectStore`].
pub fn files_router(store: LocalObjectStore) -> Router {
    Router::new()
        .route("/files/{*key}", get(download_object))
        .with_state(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, Bytes},
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn store_with_object() -> (LocalObjectStore, String, std::path::PathBuf) {
        let root = std::env::temp_dir().join(format!("todo-api-files-{}", unique_suffix()));
        let store = LocalObjectStore::new(&root, "http://localhost:8080/files", "signing-key");
        let key = store
            .put("todos/t1", Bytes::from_static(b"report"), "text/plain")
            .await
            .unwrap();
        (store, key, root)
    }

    fn unique_suffix() -> u128 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    }

    fn path_of(url: &str) -> String {
        url.trim_start_matches("http://localhost:8080").to_string()
    }

    #[tokio::test]
    async fn test_signed_link_serves_object() {
        let (store, key, root) = store_with_object().await;
        let link = store
            .presigned_url(&key, chrono::Duration::seconds(60))
            .await
            .unwrap();

        let response = files_router(store)
            .oneshot(
                Request::builder()
                    .uri(path_of(&link.url))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"report");
        let _ = tokio::fs::remove_dir_all(root).await;
    }

    #[tokio::test]
    async fn test_tampered_signature_is_forbidden() {
        let (store, key, root) = store_with_object().await;
        let expires = Utc::now().timestamp() + 60;
        let uri = format!("/files/{key}?expires={expires}&signature=deadbeef");

        let response = files_router(store)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let _ = tokio::fs::remove_dir_all(root).await;
    }

    #[tokio::test]
    async fn test_missing_query_is_bad_request() {
        let (store, key, root) = store_with_object().await;

        let response = files_router(store)
            .oneshot(
                Request::builder()
                    .uri(format!("/files/{key}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let _ = tokio::fs::remove_dir_all(root).await;
    }
}
