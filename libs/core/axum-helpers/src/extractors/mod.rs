//! Request extractors that reject with [`AppError`](crate::errors::AppError).

pub mod principal;
pub mod uuid_path;
pub mod validated_json;
pub mod validated_query;

pub use principal::Principal;
pub use uuid_path::{UuidPath, UuidPath2};
pub use validated_json::ValidatedJson;
pub use validated_query::ValidatedQuery;
