//! End-to-end reminder delivery through a real Redis (testcontainers).
//!
//! Needs docker: `cargo test -p email -- --ignored`.

use chrono::Utc;
use email::{
    Contact, InMemoryContactResolver, MockSender, ReminderJob, ReminderKind, ReminderProcessor,
    ReminderQueue, TemplateEngine,
};
use stream_worker::{QueueTier, StreamProducer, StreamWorker, WorkerConfig};
use test_utils::TestRedis;
use uuid::Uuid;

async fn processor(
    sender: MockSender,
) -> ReminderProcessor<InMemoryContactResolver, MockSender> {
    let contacts = InMemoryContactResolver::new();
    contacts
        .insert("alice", Contact::new("alice@example.com"))
        .await;
    ReminderProcessor::new(contacts, sender, TemplateEngine::new().unwrap())
}

fn job(kind: ReminderKind, user: &str, title: &str) -> ReminderJob {
    ReminderJob::new(kind, Uuid::now_v7(), user, title, Utc::now())
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_overdue_delivered_before_due_soon() {
    let redis = TestRedis::new().await;
    let sender = MockSender::new();
    let config = WorkerConfig::from_queue_def::<ReminderQueue>().with_block_timeout_ms(100);
    let worker = StreamWorker::new(redis.connection(), processor(sender.clone()).await, config);
    worker.consumer().init_consumer_groups().await.unwrap();

    let producer = StreamProducer::from_queue_def::<ReminderQueue>(redis.connection());
    let soon = job(ReminderKind::DueSoon, "alice", "soon");
    let late = job(ReminderKind::Overdue, "alice", "late");
    producer.enqueue(&soon, soon.tier()).await.unwrap();
    producer.enqueue(&late, late.tier()).await.unwrap();

    let handled = worker.process_batch().await.unwrap();
    assert_eq!(handled, 2);

    let subjects: Vec<String> = sender.sent().await.into_iter().map(|e| e.subject).collect();
    assert_eq!(subjects.len(), 2);
    assert!(subjects[0].starts_with("Overdue"));
    assert!(subjects[1].starts_with("Reminder"));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_failed_send_is_retried_then_delivered() {
    let redis = TestRedis::new().await;
    let sender = MockSender::failing_times(1);
    let config = WorkerConfig::from_queue_def::<ReminderQueue>().with_block_timeout_ms(100);
    let worker = StreamWorker::new(redis.connection(), processor(sender.clone()).await, config);
    worker.consumer().init_consumer_groups().await.unwrap();

    let producer = StreamProducer::from_queue_def::<ReminderQueue>(redis.connection());
    let reminder = job(ReminderKind::DueSoon, "alice", "retry me");
    producer.enqueue(&reminder, QueueTier::Default).await.unwrap();

    worker.process_batch().await.unwrap();
    assert_eq!(sender.sent_count().await, 0);
    // Re-enqueued with retry_count = 1
    assert_eq!(producer.stream_length(QueueTier::Default).await.unwrap(), 2);

    worker.process_batch().await.unwrap();
    assert_eq!(sender.sent_count().await, 1);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_unknown_user_is_dropped_without_retry() {
    let redis = TestRedis::new().await;
    let sender = MockSender::new();
    let config = WorkerConfig::from_queue_def::<ReminderQueue>().with_block_timeout_ms(100);
    let worker = StreamWorker::new(redis.connection(), processor(sender.clone()).await, config);
    worker.consumer().init_consumer_groups().await.unwrap();

    let producer = StreamProducer::from_queue_def::<ReminderQueue>(redis.connection());
    let reminder = job(ReminderKind::Overdue, "ghost", "nobody");
    producer.enqueue(&reminder, reminder.tier()).await.unwrap();

    worker.process_batch().await.unwrap();
    assert_eq!(sender.sent_count().await, 0);
    assert_eq!(producer.stream_length(QueueTier::Critical).await.unwrap(), 1);
}
