//! Stream producer for job enqueuing
//!
//! Any service can use this to queue jobs for background processing.
//!
//! ```rust,ignore
//! let producer = StreamProducer::from_queue_def::<ReminderQueue>(redis);
//! let message_id = producer.enqueue(&job, QueueTier::Critical).await?;
//! ```

use crate::error::StreamError;
use crate::registry::{JOB_FIELD, QueueDef, QueueTier};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::Serialize;
use tracing::debug;

/// Producer that appends jobs to the tier streams of one queue.
#[derive(Clone)]
pub struct StreamProducer {
    redis: ConnectionManager,
    queue_name: String,
    max_length: i64,
}

impl StreamProducer {
    pub fn new(redis: ConnectionManager, queue_name: impl Into<String>) -> Self {
        Self {
            redis,
            queue_name: queue_name.into(),
            max_length: 100_000,
        }
    }

    /// Create a producer from a `QueueDef`, keeping names consistent with the worker.
    pub fn from_queue_def<Q: QueueDef>(redis: ConnectionManager) -> Self {
        Self {
            redis,
            queue_name: Q::QUEUE_NAME.to_string(),
            max_length: Q::MAX_LENGTH,
        }
    }

    /// Set the maximum stream length (MAXLEN ~).
    pub fn with_max_length(mut self, max_length: i64) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    /// Append a job to the stream of `tier`.
    ///
    /// Returns the Redis stream message ID once Redis has accepted the entry.
    pub async fn enqueue<J: Serialize>(
        &self,
        job: &J,
        tier: QueueTier,
    ) -> Result<String, StreamError> {
        let mut conn = self.redis.clone();
        let stream = tier.stream_key(&self.queue_name);
        let job_json = serde_json::to_string(job)?;

        let stream_id: String = redis::cmd("XADD")
            .arg(&stream)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.max_length)
            .arg("*")
            .arg(JOB_FIELD)
            .arg(&job_json)
            .query_async(&mut conn)
            .await?;

        debug!(stream = %stream, stream_id = %stream_id, "Enqueued job");

        Ok(stream_id)
    }

    /// Current length of one tier stream.
    pub async fn stream_length(&self, tier: QueueTier) -> Result<u64, StreamError> {
        let mut conn = self.redis.clone();
        let len: u64 = conn.xlen(tier.stream_key(&self.queue_name)).await?;
        Ok(len)
    }
}
