use database::postgres::DatabaseConnection;
use database::redis::ConnectionManager;
use eyre::WrapErr;
use tracing::{error, info};

use crate::config::Config;

/// Connections shared by the consumer, the scheduler and the health server.
#[derive(Clone)]
pub struct WorkerContext {
    pub config: Config,
    pub db: DatabaseConnection,
    pub redis: ConnectionManager,
}

impl WorkerContext {
    pub async fn connect(config: Config) -> eyre::Result<Self> {
        let postgres = async {
            database::postgres::connect_from_config_with_retry(config.database.clone(), None)
                .await
                .wrap_err("PostgreSQL connection failed")
        };
        let redis = async {
            database::redis::connect_from_config_with_retry(config.redis.clone(), None)
                .await
                .wrap_err("Redis connection failed")
        };
        let (db, redis) = tokio::try_join!(postgres, redis)?;

        Ok(Self { config, db, redis })
    }

    pub async fn shutdown(self) {
        match self.db.close().await {
            Ok(()) => info!("PostgreSQL connection closed"),
            Err(e) => error!(error = %e, "error closing PostgreSQL"),
        }
        drop(self.redis);
    }
}
