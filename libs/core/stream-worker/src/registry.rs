//! Queue definitions and priority tiers.
//!
//! A queue is a set of three Redis streams, one per [`QueueTier`], that share a
//! single consumer group. Stream keys are `<queue>:<tier>`.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Priority tier of a queued job.
///
/// Variants are declared in dispatch order: the consumer always handles
/// `Critical` entries before `Default` ones, and `Default` before `Low`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[derive(Display, AsRefStr, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QueueTier {
    Critical,
    Default,
    Low,
}

impl QueueTier {
    /// All tiers, highest priority first.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    /// Stream key for this tier of `queue`.
    pub fn stream_key(&self, queue: &str) -> String {
        format!("{}:{}", queue, self.as_ref())
    }

    /// Resolve a stream key back to its tier.
    pub fn from_stream_key(queue: &str, key: &str) -> Option<Self> {
        key.strip_prefix(queue)
            .and_then(|rest| rest.strip_prefix(':'))
            .and_then(|tier| tier.parse().ok())
    }
}

/// Field name holding the JSON payload in every stream entry.
pub const JOB_FIELD: &str = "job";

/// Queue definition trait.
///
/// Each job family implements this to pin its queue name and consumer group.
///
/// ```rust,ignore
/// pub struct ReminderQueue;
///
/// impl QueueDef for ReminderQueue {
///     const QUEUE_NAME: &'static str = "todo:notifications";
///     const CONSUMER_GROUP: &'static str = "notification_workers";
/// }
/// ```
pub trait QueueDef: Send + Sync {
    /// Base name; tier streams are derived from it.
    const QUEUE_NAME: &'static str;

    /// Consumer group shared by all tier streams.
    const CONSUMER_GROUP: &'static str;

    /// Approximate MAXLEN applied on every XADD.
    const MAX_LENGTH: i64 = 100_000;

    /// Attempts before a failing job is dropped.
    const MAX_RETRIES: u32 = 3;

    /// Idle time after which another consumer's pending entry may be reclaimed.
    const CLAIM_IDLE_MS: u64 = 60_000;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_order() {
        let tiers: Vec<_> = QueueTier::all().collect();
        assert_eq!(
            tiers,
            vec![QueueTier::Critical, QueueTier::Default, QueueTier::Low]
        );
        assert!(QueueTier::Critical < QueueTier::Low);
    }

    #[test]
    fn test_stream_key_round_trip() {
        let key = QueueTier::Critical.stream_key("todo:notifications");
        assert_eq!(key, "todo:notifications:critical");
        assert_eq!(
            QueueTier::from_stream_key("todo:notifications", &key),
            Some(QueueTier::Critical)
        );
        assert_eq!(
            QueueTier::from_stream_key("todo:notifications", "other:low"),
            None
        );
    }

    #[test]
    fn test_tier_serde() {
        let json = serde_json::to_string(&QueueTier::Low).unwrap();
        assert_eq!(json, "\"low\"");
        assert_eq!("default".parse::<QueueTier>().unwrap(), QueueTier::Default);
    }
}
