//! Core worker traits and the generic StreamWorker implementation.
//!
//! This module provides:
//! - `StreamJob` trait for job payloads
//! - `StreamProcessor` trait for job processors
//! - `StreamWorker` struct for running the worker loop

use crate::config::WorkerConfig;
use crate::consumer::{Delivery, StreamConsumer};
use crate::error::{ErrorCategory, StreamError};
use crate::metrics::StreamMetrics;
use crate::producer::StreamProducer;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Trait for stream job payloads.
///
/// ```rust,ignore
/// impl StreamJob for ReminderJob {
///     fn job_id(&self) -> String {
///         self.id.to_string()
///     }
///
///     fn retry_count(&self) -> u32 {
///         self.retry_count
///     }
///
///     fn with_retry(&self) -> Self {
///         Self {
///             retry_count: self.retry_count.saturating_add(1),
///             ..self.clone()
///         }
///     }
/// }
/// ```
pub trait StreamJob: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the job ID for logging and tracking.
    fn job_id(&self) -> String;

    /// Number of failed attempts so far.
    fn retry_count(&self) -> u32;

    /// Creates a copy with the retry count incremented.
    fn with_retry(&self) -> Self;
}

/// Trait for job processors.
#[async_trait]
pub trait StreamProcessor<J: StreamJob>: Send + Sync {
    /// Process a single job.
    ///
    /// Transient errors are retried by re-enqueueing, permanent ones drop the job.
    async fn process(&self, job: &J) -> Result<(), StreamError>;

    /// Get the processor name for logging.
    fn name(&self) -> &'static str;

    /// Default: always healthy.
    async fn health_check(&self) -> Result<bool, StreamError> {
        Ok(true)
    }
}

/// What happens to a job after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDisposition {
    /// Re-enqueue on the same tier with the retry count incremented.
    Retry,
    /// Attempts exhausted.
    DropExhausted,
    /// Not worth retrying.
    DropPermanent,
}

impl FailureDisposition {
    pub fn decide(error: &StreamError, retry_count: u32, max_retries: u32) -> Self {
        if error.category() == ErrorCategory::Permanent {
            FailureDisposition::DropPermanent
        } else if error.should_retry(retry_count, max_retries) {
            FailureDisposition::Retry
        } else {
            FailureDisposition::DropExhausted
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            FailureDisposition::Retry => "retry",
            FailureDisposition::DropExhausted => "exhausted",
            FailureDisposition::DropPermanent => "permanent",
        }
    }
}

/// Generic stream worker that processes jobs using a processor.
///
/// The loop:
/// - creates the consumer group on every tier stream
/// - reads pending then new entries, critical tier first
/// - processes entries one at a time so tier order holds
/// - re-enqueues failed jobs on the same tier until their attempts run out
/// - periodically reclaims entries abandoned by dead consumers
/// - stops when the shutdown channel flips to `true`
pub struct StreamWorker<J, P>
where
    J: StreamJob,
    P: StreamProcessor<J>,
{
    consumer: StreamConsumer,
    producer: StreamProducer,
    processor: Arc<P>,
    config: WorkerConfig,
    metrics: StreamMetrics,
    _phantom: PhantomData<J>,
}

impl<J, P> StreamWorker<J, P>
where
    J: StreamJob + 'static,
    P: StreamProcessor<J> + 'static,
{
    pub fn new(redis: ConnectionManager, processor: P, config: WorkerConfig) -> Self {
        Self::with_arc_processor(redis, Arc::new(processor), config)
    }

    pub fn with_arc_processor(
        redis: ConnectionManager,
        processor: Arc<P>,
        config: WorkerConfig,
    ) -> Self {
        let consumer = StreamConsumer::new(redis.clone(), config.clone());
        let producer = StreamProducer::new(redis, config.queue_name.clone())
            .with_max_length(config.max_length);
        let metrics = StreamMetrics::new(config.queue_name.clone(), processor.name());

        Self {
            consumer,
            producer,
            processor,
            config,
            metrics,
            _phantom: PhantomData,
        }
    }

    pub fn consumer(&self) -> &StreamConsumer {
        &self.consumer
    }

    pub fn processor(&self) -> &Arc<P> {
        &self.processor
    }

    /// Run the worker loop until the shutdown receiver reports `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), StreamError> {
        info!(
            consumer_id = %self.config.consumer_id,
            queue = %self.config.queue_name,
            group = %self.config.consumer_group,
            processor = %self.processor.name(),
            max_retries = self.config.max_retries,
            "Starting stream worker"
        );

        self.consumer.init_consumer_groups().await?;

        let claim_interval = Duration::from_millis(self.config.claim_idle_ms.max(1000));
        let mut last_claim: Option<Instant> = None;
        let mut consecutive_errors: u32 = 0;
        const MAX_BACKOFF_SECS: u64 = 30;

        loop {
            if *shutdown.borrow() {
                info!("Received shutdown signal, stopping worker");
                break;
            }

            if last_claim.is_none_or(|t| t.elapsed() >= claim_interval) {
                match self.consumer.claim_abandoned().await {
                    Ok(claimed) => {
                        for (tier, count) in claimed.into_iter().filter(|(_, c)| *c > 0) {
                            self.metrics.messages_claimed(tier.as_ref(), count);
                        }
                    }
                    Err(e) => debug!(error = %e, "Error claiming abandoned messages"),
                }
                last_claim = Some(Instant::now());
            }

            let batch = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        info!("Shutdown channel closed, stopping worker");
                        break;
                    }
                    continue;
                }
                batch = self.process_batch() => batch,
            };

            match batch {
                Ok(_) => {
                    if consecutive_errors > 0 {
                        info!(consecutive_errors, "Connection recovered");
                        consecutive_errors = 0;
                    }
                }
                Err(e) if e.is_timeout() => {
                    debug!("BLOCK timeout - no messages, continuing");
                }
                Err(e) => {
                    consecutive_errors += 1;

                    if e.is_nogroup_error() {
                        warn!("Consumer group missing, recreating");
                        if let Err(create_err) = self.consumer.init_consumer_groups().await {
                            error!(error = %create_err, "Failed to recreate consumer groups");
                        }
                    } else if e.is_connection_error() {
                        let backoff_secs =
                            std::cmp::min(2u64.pow(consecutive_errors.min(5)), MAX_BACKOFF_SECS);
                        warn!(
                            error = %e,
                            consecutive_errors,
                            backoff_secs,
                            "Redis connection error, backing off"
                        );
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                    } else {
                        error!(error = %e, "Error processing batch");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }

        info!("Stream worker stopped");
        Ok(())
    }

    /// Read one batch and process it in tier order.
    ///
    /// Returns the number of entries handled.
    pub async fn process_batch(&self) -> Result<usize, StreamError> {
        let (deliveries, malformed) = self.consumer.read_batch::<J>().await?;

        for bad in &malformed {
            error!(
                tier = %bad.tier,
                message_id = %bad.message_id,
                reason = %bad.reason,
                "Dropping undecodable entry"
            );
            self.metrics.job_dropped(bad.tier.as_ref(), "malformed");
            if let Err(e) = self.consumer.ack(bad.tier, &bad.message_id).await {
                error!(message_id = %bad.message_id, error = %e, "Failed to ACK message");
            }
        }

        let total = deliveries.len() + malformed.len();
        if total > 0 {
            self.metrics.batch_size(total);
        }

        for delivery in deliveries {
            self.process_delivery(delivery).await;
        }

        Ok(total)
    }

    async fn process_delivery(&self, delivery: Delivery<J>) {
        let Delivery {
            tier,
            message_id,
            job,
        } = delivery;
        let tier_name = tier.as_ref();

        debug!(tier = %tier, message_id = %message_id, job_id = %job.job_id(), "Processing job");
        self.metrics.job_received(tier_name);

        let start = Instant::now();
        match self.processor.process(&job).await {
            Ok(()) => {
                self.metrics.job_processed(tier_name, start.elapsed());
            }
            Err(e) => {
                let category = e.category();
                self.metrics.job_failed(tier_name, category.as_str());

                let disposition =
                    FailureDisposition::decide(&e, job.retry_count(), self.config.max_retries);

                match disposition {
                    FailureDisposition::Retry => {
                        let retry = job.with_retry();
                        warn!(
                            tier = %tier,
                            job_id = %job.job_id(),
                            attempt = retry.retry_count(),
                            max_retries = self.config.max_retries,
                            error = %e,
                            "Job failed, re-enqueueing"
                        );
                        match self.producer.enqueue(&retry, tier).await {
                            Ok(_) => self.metrics.job_retried(tier_name),
                            Err(enqueue_err) => {
                                // leave the entry pending so it is redelivered
                                error!(
                                    job_id = %job.job_id(),
                                    error = %enqueue_err,
                                    "Failed to re-enqueue job"
                                );
                                return;
                            }
                        }
                    }
                    FailureDisposition::DropExhausted | FailureDisposition::DropPermanent => {
                        error!(
                            tier = %tier,
                            job_id = %job.job_id(),
                            retry_count = job.retry_count(),
                            error = %e,
                            error_category = category.as_str(),
                            reason = disposition.reason(),
                            "Dropping job"
                        );
                        self.metrics.job_dropped(tier_name, disposition.reason());
                    }
                }
            }
        }

        if let Err(e) = self.consumer.ack(tier, &message_id).await {
            error!(message_id = %message_id, error = %e, "Failed to ACK message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct TestJob {
        id: String,
        retry_count: u32,
    }

    impl StreamJob for TestJob {
        fn job_id(&self) -> String {
            self.id.clone()
        }

        fn retry_count(&self) -> u32 {
            self.retry_count
        }

        fn with_retry(&self) -> Self {
            Self {
                retry_count: self.retry_count.saturating_add(1),
                ..self.clone()
            }
        }
    }

    #[test]
    fn test_stream_job_trait() {
        let job = TestJob {
            id: "job-1".into(),
            retry_count: 0,
        };
        let retried = job.with_retry().with_retry();
        assert_eq!(retried.retry_count(), 2);
        assert_eq!(retried.job_id(), "job-1");
    }

    #[test]
    fn test_transient_failure_retried_until_cap() {
        let err = StreamError::transient("smtp timeout");
        assert_eq!(
            FailureDisposition::decide(&err, 0, 3),
            FailureDisposition::Retry
        );
        assert_eq!(
            FailureDisposition::decide(&err, 1, 3),
            FailureDisposition::Retry
        );
        assert_eq!(
            FailureDisposition::decide(&err, 2, 3),
            FailureDisposition::DropExhausted
        );
    }

    #[test]
    fn test_permanent_failure_dropped_immediately() {
        let err = StreamError::permanent("no contact address");
        assert_eq!(
            FailureDisposition::decide(&err, 0, 3),
            FailureDisposition::DropPermanent
        );
    }
}
