//! Shared HTTP plumbing for the todo services.
//!
//! - [`errors`]: `AppError` and the `{code, message, status, errors}` envelope
//! - [`extractors`]: validated JSON/query bodies, UUID paths, the authenticated [`Principal`]
//! - [`auth`]: bearer-token verification middleware
//! - [`server`]: router assembly, health endpoints, graceful shutdown
//! - [`http`]: CORS and security headers

pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{JwtClaims, JwtConfig, JwtVerifier, jwt_auth_middleware};
pub use errors::{AppError, ErrorCode, ErrorResponse, FieldError};
pub use extractors::{Principal, UuidPath, UuidPath2, ValidatedJson, ValidatedQuery};
pub use http::{create_cors_layer, security_headers};
pub use server::{
    HealthCheckFuture, ShutdownCoordinator, create_production_app, create_router, health_router,
    run_health_checks, shutdown_signal,
};
