//! Reminder notifications delivered through the Redis Streams queue.
//!
//! ## Components
//!
//! - **Work item**: [`ReminderJob`] on the [`ReminderQueue`], tier chosen by [`ReminderKind`]
//! - **Contact lookup**: [`ContactResolver`] with an HTTP adapter for the identity
//!   provider's user API and an in-memory double
//! - **Delivery**: [`NotificationSender`] with SMTP (lettre) and a recording mock
//! - **Templates**: Handlebars `due_soon` and `overdue` in [`TemplateEngine`]
//! - **Processing**: [`ReminderProcessor`] plugs all of the above into `stream_worker`
//!
//! ```ignore
//! use email::{HttpContactResolver, ReminderProcessor, ReminderQueue, SmtpSender, TemplateEngine};
//! use stream_worker::{StreamWorker, WorkerConfig};
//!
//! let processor = ReminderProcessor::new(contacts, sender, TemplateEngine::new()?);
//! let config = WorkerConfig::from_queue_def::<ReminderQueue>();
//! StreamWorker::new(redis, processor, config).run(shutdown_rx).await?;
//! ```

pub mod contact;
pub mod error;
pub mod job;
pub mod models;
pub mod processor;
pub mod provider;
pub mod streams;
pub mod templates;

pub use contact::{ContactConfig, ContactResolver, HttpContactResolver, InMemoryContactResolver};
pub use error::{NotificationError, NotificationResult};
pub use job::{ReminderJob, ReminderKind};
pub use models::{Contact, Email, SendResult};
pub use processor::ReminderProcessor;
pub use provider::{MockSender, NotificationSender, SmtpConfig, SmtpSender};
pub use streams::ReminderQueue;
pub use templates::{EmailTemplate, RenderedTemplate, TemplateEngine};
