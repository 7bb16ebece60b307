//! Stream consumer for Redis operations
//!
//! Reads the tier streams of one queue through a single consumer group and
//! hands entries back ordered by tier.

use crate::config::WorkerConfig;
use crate::error::StreamError;
use crate::registry::{JOB_FIELD, QueueTier};
use redis::aio::ConnectionManager;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, RedisResult, Value};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

/// One entry read from a tier stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery<J> {
    pub tier: QueueTier,
    pub message_id: String,
    pub job: J,
}

/// Entry whose payload is missing or cannot be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Malformed {
    pub tier: QueueTier,
    pub message_id: String,
    pub reason: String,
}

/// Raw entries of one stream: `(stream key, [(message id, job payload)])`.
pub type RawEntries = Vec<(String, Vec<(String, Option<String>)>)>;

pub struct StreamConsumer {
    redis: ConnectionManager,
    config: WorkerConfig,
}

impl StreamConsumer {
    pub fn new(redis: ConnectionManager, config: WorkerConfig) -> Self {
        Self { redis, config }
    }

    pub fn redis(&self) -> &ConnectionManager {
        &self.redis
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Create the consumer group on every tier stream if it doesn't exist
    pub async fn init_consumer_groups(&self) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();

        for stream in self.config.stream_keys() {
            let result: RedisResult<()> = redis::cmd("XGROUP")
                .arg("CREATE")
                .arg(&stream)
                .arg(&self.config.consumer_group)
                .arg("0")
                .arg("MKSTREAM")
                .query_async(&mut conn)
                .await;

            match result {
                Ok(_) => {
                    info!(stream = %stream, group = %self.config.consumer_group, "Created consumer group");
                }
                Err(e) if e.to_string().contains("BUSYGROUP") => {
                    debug!(stream = %stream, group = %self.config.consumer_group, "Consumer group already exists");
                }
                Err(e) => return Err(StreamError::Redis(e)),
            }
        }

        Ok(())
    }

    /// Read the next batch.
    ///
    /// Entries already delivered to this consumer but never acked (including
    /// reclaimed ones) come first; otherwise a blocking read for new entries
    /// is issued across all tiers at once.
    pub async fn read_batch<J: DeserializeOwned>(
        &self,
    ) -> Result<(Vec<Delivery<J>>, Vec<Malformed>), StreamError> {
        let pending = self.read(&["0", "0", "0"], None).await?;
        let (deliveries, malformed) = order_entries(&self.config.queue_name, pending);
        if !deliveries.is_empty() || !malformed.is_empty() {
            return Ok((deliveries, malformed));
        }

        let fresh = self
            .read(&[">", ">", ">"], Some(self.config.block_timeout_ms))
            .await?;
        Ok(order_entries(&self.config.queue_name, fresh))
    }

    async fn read(&self, ids: &[&str], block_ms: Option<u64>) -> Result<RawEntries, StreamError> {
        let mut conn = self.redis.clone();
        let keys = self.config.stream_keys();

        let mut opts = StreamReadOptions::default()
            .group(&self.config.consumer_group, &self.config.consumer_id)
            .count(self.config.batch_size);
        if let Some(ms) = block_ms {
            opts = opts.block(ms as usize);
        }

        // BLOCK returns nil when the timeout expires with nothing to read
        let reply: Option<StreamReadReply> = match conn.xread_options(&keys, ids, &opts).await {
            Ok(reply) => reply,
            Err(e) if e.is_timeout() => return Ok(Vec::new()),
            Err(e) => return Err(StreamError::Redis(e)),
        };

        Ok(reply
            .map(|r| {
                r.keys
                    .into_iter()
                    .map(|key| {
                        let ids = key
                            .ids
                            .into_iter()
                            .map(|entry| {
                                let payload = entry.map.get(JOB_FIELD).and_then(value_to_string);
                                (entry.id, payload)
                            })
                            .collect();
                        (key.key, ids)
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Acknowledge an entry on its tier stream
    pub async fn ack(&self, tier: QueueTier, message_id: &str) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();
        let _: i64 = conn
            .xack(
                self.config.stream_key(tier),
                &self.config.consumer_group,
                &[message_id],
            )
            .await?;
        Ok(())
    }

    /// Take over entries other consumers left pending longer than the idle timeout.
    ///
    /// Claimed entries join this consumer's pending list and are returned by the
    /// next [`read_batch`](Self::read_batch). Returns the number claimed per tier.
    pub async fn claim_abandoned(&self) -> Result<Vec<(QueueTier, usize)>, StreamError> {
        let mut conn = self.redis.clone();
        let mut claimed = Vec::new();

        for tier in QueueTier::all() {
            let reply: Value = redis::cmd("XAUTOCLAIM")
                .arg(self.config.stream_key(tier))
                .arg(&self.config.consumer_group)
                .arg(&self.config.consumer_id)
                .arg(self.config.claim_idle_ms)
                .arg("0-0")
                .arg("COUNT")
                .arg(self.config.batch_size)
                .arg("JUSTID")
                .query_async(&mut conn)
                .await?;

            let count = match reply {
                Value::Array(parts) => match parts.get(1) {
                    Some(Value::Array(ids)) => ids.len(),
                    _ => 0,
                },
                _ => 0,
            };

            if count > 0 {
                warn!(tier = %tier, count, "Claimed abandoned entries");
            }
            claimed.push((tier, count));
        }

        Ok(claimed)
    }

    /// Length of each tier stream
    pub async fn stream_lengths(&self) -> Result<Vec<(QueueTier, u64)>, StreamError> {
        let mut conn = self.redis.clone();
        let mut lengths = Vec::new();
        for tier in QueueTier::all() {
            let len: u64 = conn.xlen(self.config.stream_key(tier)).await?;
            lengths.push((tier, len));
        }
        Ok(lengths)
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::BulkString(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::SimpleString(s) => Some(s.clone()),
        _ => None,
    }
}

/// Decode raw entries and order them by tier, keeping stream order within a tier.
///
/// Entries from unknown streams are ignored; entries with a missing or
/// undecodable payload are reported as [`Malformed`] so the caller can ack them.
pub fn order_entries<J: DeserializeOwned>(
    queue_name: &str,
    raw: RawEntries,
) -> (Vec<Delivery<J>>, Vec<Malformed>) {
    let mut deliveries = Vec::new();
    let mut malformed = Vec::new();

    for (key, entries) in raw {
        let Some(tier) = QueueTier::from_stream_key(queue_name, &key) else {
            warn!(stream = %key, "Entry from unknown stream ignored");
            continue;
        };

        for (message_id, payload) in entries {
            let Some(payload) = payload else {
                malformed.push(Malformed {
                    tier,
                    message_id,
                    reason: format!("missing '{JOB_FIELD}' field"),
                });
                continue;
            };

            match serde_json::from_str::<J>(&payload) {
                Ok(job) => deliveries.push(Delivery {
                    tier,
                    message_id,
                    job,
                }),
                Err(e) => malformed.push(Malformed {
                    tier,
                    message_id,
                    reason: e.to_string(),
                }),
            }
        }
    }

    // stable sort keeps per-stream order
    deliveries.sort_by_key(|d| d.tier);
    (deliveries, malformed)
}
