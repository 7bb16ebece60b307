//! Worker configuration
//!
//! This module provides `WorkerConfig` for configuring the stream worker.

use crate::registry::{QueueDef, QueueTier};
use uuid::Uuid;

/// Configuration for the stream worker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Base queue name; tier streams are `<queue_name>:<tier>`
    pub queue_name: String,

    /// Consumer group shared by all tier streams
    pub consumer_group: String,

    /// Unique consumer ID (auto-generated if not provided)
    pub consumer_id: String,

    /// Maximum stream length before trimming
    pub max_length: i64,

    /// Entries read per XREADGROUP call, across all tiers
    pub batch_size: usize,

    /// Blocking read timeout in milliseconds
    pub block_timeout_ms: u64,

    /// Total attempts before a failing job is dropped
    pub max_retries: u32,

    /// Idle time before pending entries of a dead consumer are reclaimed
    pub claim_idle_ms: u64,
}

impl WorkerConfig {
    /// Create a new WorkerConfig from a QueueDef
    pub fn from_queue_def<Q: QueueDef>() -> Self {
        Self {
            queue_name: Q::QUEUE_NAME.to_string(),
            consumer_group: Q::CONSUMER_GROUP.to_string(),
            consumer_id: format!("worker-{}", Uuid::now_v7()),
            max_length: Q::MAX_LENGTH,
            batch_size: 10,
            block_timeout_ms: 5000,
            max_retries: Q::MAX_RETRIES,
            claim_idle_ms: Q::CLAIM_IDLE_MS,
        }
    }

    /// Create a new WorkerConfig with explicit values
    pub fn new(queue_name: impl Into<String>, consumer_group: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            consumer_group: consumer_group.into(),
            consumer_id: format!("worker-{}", Uuid::now_v7()),
            max_length: 100_000,
            batch_size: 10,
            block_timeout_ms: 5000,
            max_retries: 3,
            claim_idle_ms: 60_000,
        }
    }

    /// Stream key of one tier
    pub fn stream_key(&self, tier: QueueTier) -> String {
        tier.stream_key(&self.queue_name)
    }

    /// Stream keys of all tiers, highest priority first
    pub fn stream_keys(&self) -> Vec<String> {
        QueueTier::all().map(|t| self.stream_key(t)).collect()
    }

    pub fn with_queue_name(mut self, name: impl Into<String>) -> Self {
        self.queue_name = name.into();
        self
    }

    pub fn with_consumer_id(mut self, id: impl Into<String>) -> Self {
        self.consumer_id = id.into();
        self
    }

    pub fn with_max_length(mut self, max_length: i64) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_block_timeout_ms(mut self, timeout: u64) -> Self {
        self.block_timeout_ms = timeout;
        self
    }

    /// Set the attempt cap; at least one attempt is always made
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn with_claim_idle_ms(mut self, idle: u64) -> Self {
        self.claim_idle_ms = idle;
        self
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new("jobs", "workers")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestQueue;

    impl QueueDef for TestQueue {
        const QUEUE_NAME: &'static str = "test:queue";
        const CONSUMER_GROUP: &'static str = "test_group";
    }

    #[test]
    fn test_from_queue_def() {
        let config = WorkerConfig::from_queue_def::<TestQueue>();

        assert_eq!(config.queue_name, "test:queue");
        assert_eq!(config.consumer_group, "test_group");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.max_length, 100_000);
        assert!(config.consumer_id.starts_with("worker-"));
    }

    #[test]
    fn test_stream_keys_in_priority_order() {
        let config = WorkerConfig::new("q", "g");
        assert_eq!(config.stream_keys(), vec!["q:critical", "q:default", "q:low"]);
    }

    #[test]
    fn test_builder_pattern() {
        let config = WorkerConfig::new("my:queue", "my_group")
            .with_consumer_id("worker-1")
            .with_batch_size(0)
            .with_max_retries(0)
            .with_block_timeout_ms(10_000);

        assert_eq!(config.consumer_id, "worker-1");
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.block_timeout_ms, 10_000);
    }
}
