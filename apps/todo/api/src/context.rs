//! Process-wide resources, built once in `main` and handed to every component.

use database::postgres::DatabaseConnection;
use database::redis::ConnectionManager;
use domain_todos::LocalObjectStore;
use eyre::WrapErr;
use tracing::{error, info};

use crate::config::Config;

#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub db: DatabaseConnection,
    pub redis: ConnectionManager,
    pub objects: LocalObjectStore,
}

impl AppContext {
    /// Connects Postgres and Redis concurrently, retrying while they start.
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

        let objects = LocalObjectStore::new(
            &config.object_store.root,
            &config.object_store.public_url,
            &config.object_store.signing_key,
        );

        Ok(Self {
            config,
            db,
            redis,
            objects,
        })
    }

    /// Closes the pool. The Redis manager closes when dropped.
    pub async fn shutdown(self) {
        match self.db.close().await {
            Ok(()) => info!("PostgreSQL connection closed"),
            Err(e) => error!(error = %e, "error closing PostgreSQL"),
        }
        drop(self.redis);
        info!("Redis connection closed");
    }
}
