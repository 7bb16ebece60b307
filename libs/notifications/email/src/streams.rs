//! Queue definition shared by the producers (scheduled jobs) and the consumer.

use stream_worker::QueueDef;

/// Due-soon and overdue reminders.
///
/// Tier streams are `todo:notifications:critical`, `:default` and `:low`.
pub struct ReminderQueue;

impl QueueDef for ReminderQueue {
    const QUEUE_NAME: &'static str = "todo:notifications";
    const CONSUMER_GROUP: &'static str = "notification_workers";
    const MAX_LENGTH: i64 = 100_000;
    const MAX_RETRIES: u32 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;
    use stream_worker::{QueueTier, WorkerConfig};

    #[test]
    fn test_reminder_queue_streams() {
        let config = WorkerConfig::from_queue_def::<ReminderQueue>();
        assert_eq!(config.consumer_group, "notification_workers");
        assert_eq!(config.max_retries, 3);
        assert_eq!(
            config.stream_key(QueueTier::Critical),
            "todo:notifications:critical"
        );
    }
}
