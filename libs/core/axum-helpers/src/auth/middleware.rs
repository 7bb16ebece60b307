use super::jwt::JwtVerifier;
use crate::errors::AppError;
use crate::extractors::Principal;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

// Session cookie set by the identity provider's browser SDK.
const SESSION_COOKIE: &str = "__session";

fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .or_else(|| {
            headers
                .get(header::COOKIE)
                .and_then(|v| v.to_str().ok())
                .and_then(|cookies| {
                    cookies.split(';').find_map(|cookie| {
                        let (name, value) = cookie.trim().split_once('=')?;
                        (name == SESSION_COOKIE).then(|| value.to_string())
                    })
                })
        })
        .filter(|token| !token.is_empty())
}

/// Verifies the bearer token (or session cookie) and inserts a [`Principal`].
pub async fn jwt_auth_middleware(
    State(verifier): State<JwtVerifier>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?;

    let claims = verifier.verify(&token).map_err(|e| {
        tracing::debug!(error = %e, "token verification failed");
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;

    request.extensions_mut().insert(Principal::from(claims));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{JwtClaims, JwtConfig};
    use axum::{Router, body::Body, http::Request as HttpRequest, middleware, routing::get};
    use tower::ServiceExt;

    fn verifier() -> JwtVerifier {
        JwtVerifier::new(&JwtConfig::new("this-is-a-valid-secret-with-32-chars!").unwrap())
    }

    async fn whoami(principal: Principal) -> String {
        principal.user_id
    }

    fn app(v: JwtVerifier) -> Router {
        Router::new()
            .route("/me", get(whoami))
            .layer(middleware::from_fn_with_state(v, jwt_auth_middleware))
    }

    fn token(v: &JwtVerifier) -> String {
        let now = chrono::Utc::now().timestamp();
        v.sign(&JwtClaims {
            sub: "user_abc".to_string(),
            roles: vec![],
            exp: now + 300,
            iat: now,
            iss: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = app(verifier())
            .oneshot(HttpRequest::get("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
    }

    #[tokio::test]
    async fn test_bearer_token_accepted() {
        let v = verifier();
        let response = app(v.clone())
            .oneshot(
                HttpRequest::get("/me")
                    .header("authorization", format!("Bearer {}", token(&v)))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_session_cookie_accepted() {
        let v = verifier();
        let response = app(v.clone())
            .oneshot(
                HttpRequest::get("/me")
                    .header("cookie", format!("theme=dark; __session={}", token(&v)))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let response = app(verifier())
            .oneshot(
                HttpRequest::get("/me")
                    .header("authorization", "Bearer nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
    }

    #[test]
    fn test_extract_token_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer from-header".parse().unwrap());
        headers.insert(header::COOKIE, "__session=from-cookie".parse().unwrap());
        assert_eq!(extract_token(&headers).as_deref(), Some("from-header"));
    }
}
