//! Redis container for queue tests.

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::redis::Redis;

/// A Redis 8 container plus a managed connection to it. The container is
/// removed when this value is dropped.
pub struct TestRedis {
    _container: ContainerAsync<Redis>,
    connection: ConnectionManager,
    url: String,
}

impl TestRedis {
    pub async fn new() -> Self {
        let container = Redis::default()
            .with_tag("8-alpine")
            .start()
            .await
            .expect("Failed to start Redis container");
        let port = container
            .get_host_port_ipv4(6379)
            .await
            .expect("Failed to get Redis port");

        let url = format!("redis://127.0.0.1:{port}");
        let client = Client::open(url.as_str()).expect("Invalid Redis URL");
        let connection = ConnectionManager::new(client)
            .await
            .expect("Failed to connect to Redis");
        tracing::info!(%url, "test Redis ready");

        Self {
            _container: container,
            connection,
            url,
        }
    }

    /// Cheap clone of the managed connection, for producers and workers.
    pub fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Number of entries in `stream`; 0 when it does not exist.
    pub async fn stream_len(&self, stream: &str) -> usize {
        let mut conn = self.connection();
        conn.xlen(stream).await.expect("XLEN failed")
    }

    /// Entries delivered to `group` but not yet acknowledged.
    pub async fn pending_count(&self, stream: &str, group: &str) -> usize {
        let mut conn = self.connection();
        let summary: (usize, Option<String>, Option<String>, redis::Value) = redis::cmd("XPENDING")
            .arg(stream)
            .arg(group)
            .query_async(&mut conn)
            .await
            .expect("XPENDING failed");
        summary.0
    }
}
