//! Connection management for the relational store and the Redis queue.
//!
//! - `postgres` (default): SeaORM pool, migrations, `SELECT 1` health check
//! - `redis` (default): `ConnectionManager` with `PING` verification
//! - `config`: `core_config::FromEnv` implementations for both configs
//!
//! ```ignore
//! let db = database::postgres::connect_from_config_with_retry(pg_config, None).await?;
//! database::postgres::run_migrations::<migration::Migrator>(&db, "todo_api").await?;
//! let redis = database::redis::connect_from_config_with_retry(redis_config, None).await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "redis")]
pub mod redis;

pub use common::{DatabaseError, DatabaseResult};
