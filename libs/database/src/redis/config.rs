#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_or_default};

/// Redis connection settings for the dispatch queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedisConfig {
    pub url: String,
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::new("redis://127.0.0.1:6379")
    }
}

/// `REDIS_URL`, falling back to `REDIS_HOST` and then the local default.
#[cfg(feature = "config")]
impl FromEnv for RedisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("REDIS_URL")
            .unwrap_or_else(|_| env_or_default("REDIS_HOST", &Self::default().url));

        if !url.starts_with("redis://") && !url.starts_with("rediss://") {
            return Err(ConfigError::Invalid {
                key: "REDIS_URL".to_string(),
                details: "expected a redis:// or rediss:// URL".to_string(),
            });
        }

        Ok(Self { url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_localhost() {
        assert_eq!(RedisConfig::default().url, "redis://127.0.0.1:6379");
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_env_prefers_redis_url() {
        temp_env::with_vars(
            [
                ("REDIS_URL", Some("redis://cache:6379")),
                ("REDIS_HOST", Some("redis://other:6379")),
            ],
            || {
                assert_eq!(RedisConfig::from_env().unwrap().url, "redis://cache:6379");
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_env_falls_back_to_default() {
        temp_env::with_vars([("REDIS_URL", None::<&str>), ("REDIS_HOST", None)], || {
            assert_eq!(RedisConfig::from_env().unwrap(), RedisConfig::default());
        });
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_env_rejects_non_redis_scheme() {
        temp_env::with_var("REDIS_URL", Some("http://cache:6379"), || {
            let err = RedisConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("REDIS_URL"));
        });
    }
}
