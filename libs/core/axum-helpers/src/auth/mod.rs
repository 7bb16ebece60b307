//! Bearer-token verification.
//!
//! Tokens are minted by the hosted identity provider; this service only
//! verifies them and turns the claims into a [`Principal`](crate::Principal).
//!
//! ```ignore
//! let verifier = JwtVerifier::new(&JwtConfig::from_env()?);
//! let api = api.layer(axum::middleware::from_fn_with_state(verifier, jwt_auth_middleware));
//! ```

pub mod config;
pub mod jwt;
pub mod middleware;

pub use config::JwtConfig;
pub use jwt::{JwtClaims, JwtVerifier};
pub use middleware::jwt_auth_middleware;
