//! Stream Worker Framework
//!
//! Redis Streams priority queue for background jobs.
//!
//! ## Features
//!
//! - **Priority tiers**: `critical`, `default` and `low` streams per queue, read
//!   in one call and dispatched highest tier first
//! - **Consumer groups**: horizontal scaling, abandoned entries reclaimed with XAUTOCLAIM
//! - **Bounded retries**: failed jobs are re-enqueued on their tier, then dropped
//! - **Prometheus metrics** and health endpoints
//!
//! ## Example
//!
//! ```ignore
//! struct ReminderQueue;
//! impl QueueDef for ReminderQueue {
//!     const QUEUE_NAME: &'static str = "todo:notifications";
//!     const CONSUMER_GROUP: &'static str = "notification_workers";
//! }
//!
//! let config = WorkerConfig::from_queue_def::<ReminderQueue>();
//! let worker = StreamWorker::new(redis, processor, config);
//! worker.run(shutdown_rx).await?;
//! ```

mod config;
mod consumer;
mod error;
mod health;
pub mod metrics;
mod producer;
mod registry;
mod worker;

pub use config::WorkerConfig;
pub use consumer::{Delivery, Malformed, StreamConsumer, order_entries};
pub use error::{ErrorCategory, StreamError};
pub use health::{HealthState, health_router};
pub use metrics::{StreamMetrics, init_metrics};
pub use producer::StreamProducer;
pub use registry::{JOB_FIELD, QueueDef, QueueTier};
pub use worker::{FailureDisposition, StreamJob, StreamProcessor, StreamWorker};
