use redis::Client;
use redis::aio::ConnectionManager;
use tracing::info;

use super::RedisConfig;
use crate::common::{RetryConfig, retry_with_backoff};

/// Opens a `ConnectionManager` and verifies it with `PING`.
pub async fn connect(url: &str) -> redis::RedisResult<ConnectionManager> {
    let client = Client::open(url)?;
    let mut manager = ConnectionManager::new(client).await?;

    let _: String = redis::cmd("PING").query_async(&mut manager).await?;

    info!("connected to Redis");
    Ok(manager)
}

pub async fn connect_from_config_with_retry(
    config: RedisConfig,
    retry_config: Option<RetryConfig>,
) -> redis::RedisResult<ConnectionManager> {
    retry_with_backoff(|| connect(&config.url), retry_config.unwrap_or_default()).await
}
