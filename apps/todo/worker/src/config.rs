//! Worker configuration.
//!
//! Connection settings come from the shared `database` configs. The contact
//! lookup and SMTP settings are loaded separately by [`NotifierConfig`] because
//! only the consumer needs them.

use core_config::{
    AppInfo, ConfigError, Environment, FromEnv, app_info, env_or_default, env_optional, env_parse,
};
use database::postgres::PostgresConfig;
use database::redis::RedisConfig;
use email::{ContactConfig, ReminderQueue, SmtpConfig};
use stream_worker::{QueueDef, WorkerConfig};

/// `QUEUE_NAME`, `WORKER_BATCH_SIZE`, `WORKER_BLOCK_MS`, `WORKER_MAX_RETRIES`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueSettings {
    pub name: String,
    pub batch_size: usize,
    pub block_ms: u64,
    pub max_retries: u32,
}

impl FromEnv for QueueSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let settings = Self {
            name: env_or_default("QUEUE_NAME", ReminderQueue::QUEUE_NAME),
            batch_size: env_parse("WORKER_BATCH_SIZE", 10)?,
            block_ms: env_parse("WORKER_BLOCK_MS", 5000)?,
            max_retries: env_parse("WORKER_MAX_RETRIES", ReminderQueue::MAX_RETRIES)?,
        };
        if settings.batch_size == 0 {
            return Err(ConfigError::Invalid {
                key: "WORKER_BATCH_SIZE".to_string(),
                details: "must be at least 1".to_string(),
            });
        }
        if settings.max_retries == 0 {
            return Err(ConfigError::Invalid {
                key: "WORKER_MAX_RETRIES".to_string(),
                details: "must be at least 1".to_string(),
            });
        }
        Ok(settings)
    }
}

impl QueueSettings {
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig::from_queue_def::<ReminderQueue>()
            .with_queue_name(&self.name)
            .with_batch_size(self.batch_size)
            .with_block_timeout_ms(self.block_ms)
            .with_max_retries(self.max_retries)
    }
}

/// Cron expressions use six fields, seconds first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub due_soon_cron: String,
    pub overdue_cron: String,
    pub due_soon_window: chrono::Duration,
    pub batch_size: u64,
}

impl FromEnv for ScheduleConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let window_hours: i64 = env_parse("DUE_SOON_WINDOW_HOURS", 24)?;
        if window_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "DUE_SOON_WINDOW_HOURS".to_string(),
                details: "must be positive".to_string(),
            });
        }

        Ok(Self {
            due_soon_cron: env_or_default("DUE_SOON_CRON", "0 0 * * * *"),
            overdue_cron: env_or_default("OVERDUE_CRON", "0 0 9 * * *"),
            due_soon_window: chrono::Duration::hours(window_hours),
            batch_size: env_parse("JOB_BATCH_SIZE", 500)?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub database: PostgresConfig,
    pub redis: RedisConfig,
    pub queue: QueueSettings,
    pub schedule: ScheduleConfig,
    pub health_port: u16,
    /// Base URL linked from reminder emails.
    pub app_url: Option<String>,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            database: PostgresConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            queue: QueueSettings::from_env()?,
            schedule: ScheduleConfig::from_env()?,
            health_port: env_parse("HEALTH_PORT", 8081)?,
            app_url: env_optional("APP_URL"),
        })
    }
}

/// Identity lookup and SMTP relay used to deliver reminders.
#[derive(Clone, Debug)]
pub struct NotifierConfig {
    pub contact: ContactConfig,
    pub smtp: SmtpConfig,
}

impl FromEnv for NotifierConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            contact: ContactConfig::from_env()?,
            smtp: SmtpConfig::from_env()?,
        })
    }
}
