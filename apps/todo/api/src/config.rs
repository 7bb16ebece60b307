use axum_helpers::JwtConfig;
use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_or_default, env_parse, env_required};
use database::postgres::PostgresConfig;
use database::redis::RedisConfig;
use std::path::PathBuf;

pub use core_config::Environment;
pub use core_config::server::ServerConfig;

/// Where attachment bytes live and how download links are signed.
///
/// - `OBJECT_STORE_ROOT` (default `./data/objects`)
/// - `OBJECT_STORE_PUBLIC_URL` (default `http://localhost:8080/files`)
/// - `OBJECT_STORE_SIGNING_KEY` (required)
/// - `PRESIGN_TTL_SECS` (default 900)
#[derive(Clone, Debug)]
pub struct ObjectStoreConfig {
    pub root: PathBuf,
    pub public_url: String,
    pub signing_key: String,
    pub presign_ttl_secs: i64,
}

impl FromEnv for ObjectStoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let presign_ttl_secs = env_parse("PRESIGN_TTL_SECS", 900i64)?;
        if presign_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                key: "PRESIGN_TTL_SECS".to_string(),
                details: "must be positive".to_string(),
            });
        }

        Ok(Self {
            root: PathBuf::from(env_or_default("OBJECT_STORE_ROOT", "./data/objects")),
            public_url: env_or_default("OBJECT_STORE_PUBLIC_URL", "http://localhost:8080/files"),
            signing_key: env_required("OBJECT_STORE_SIGNING_KEY")?,
            presign_ttl_secs,
        })
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub database: PostgresConfig,
    pub redis: RedisConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    pub jwt: JwtConfig,
    pub object_store: ObjectStoreConfig,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let database = PostgresConfig::from_env()?;
        let redis = RedisConfig::from_env()?;
        let server = ServerConfig::from_env()?;
        let jwt = JwtConfig::from_env()?;
        let object_store = ObjectStoreConfig::from_env()?;
        let max_upload_bytes =
            env_parse("MAX_UPLOAD_BYTES", domain_todos::DEFAULT_MAX_UPLOAD_BYTES)?;

        Ok(Self {
            app: app_info!(),
            database,
            redis,
            server,
            environment,
            jwt,
            object_store,
            max_upload_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "this-is-a-valid-secret-with-32-chars!";

    fn env(
        overrides: &[(&'static str, Option<&'static str>)],
    ) -> Vec<(&'static str, Option<&'static str>)> {
        let mut vars = vec![
            ("DATABASE_URL", Some("postgresql://localhost/todos")),
            ("JWT_SECRET", Some(SECRET)),
            ("OBJECT_STORE_SIGNING_KEY", Some("signing-key")),
            ("REDIS_URL", None),
            ("REDIS_HOST", None),
            ("MAX_UPLOAD_BYTES", None),
            ("PRESIGN_TTL_SECS", None),
            ("OBJECT_STORE_ROOT", None),
            ("OBJECT_STORE_PUBLIC_URL", None),
        ];
        for (key, value) in overrides {
            match vars.iter().position(|(k, _)| k == key) {
                Some(i) => vars[i].1 = *value,
                None => vars.push((*key, *value)),
            }
        }
        vars
    }

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars(env(&[]), || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.app.name, "todo_api");
            assert_eq!(config.redis.url, "redis://127.0.0.1:6379");
            assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
            assert_eq!(config.object_store.presign_ttl_secs, 900);
            assert_eq!(config.object_store.root, PathBuf::from("./data/objects"));
            assert_eq!(
                config.object_store.public_url,
                "http://localhost:8080/files"
            );
        });
    }

    #[test]
    fn test_from_env_overrides() {
        let vars = env(&[
            ("MAX_UPLOAD_BYTES", Some("2048")),
            ("PRESIGN_TTL_SECS", Some("60")),
            ("OBJECT_STORE_ROOT", Some("/var/lib/todos")),
        ]);
        temp_env::with_vars(vars, || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.max_upload_bytes, 2048);
            assert_eq!(config.object_store.presign_ttl_secs, 60);
            assert_eq!(config.object_store.root, PathBuf::from("/var/lib/todos"));
        });
    }

    #[test]
    fn test_signing_key_is_required() {
        temp_env::with_vars(env(&[("OBJECT_STORE_SIGNING_KEY", None)]), || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("OBJECT_STORE_SIGNING_KEY"));
        });
    }

    #[test]
    fn test_rejects_non_positive_ttl() {
        temp_env::with_vars(env(&[("PRESIGN_TTL_SECS", Some("0"))]), || {
            assert!(Config::from_env().is_err());
        });
    }
}
