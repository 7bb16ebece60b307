//! Delivery providers

pub mod mock;
pub mod smtp;

pub use mock::MockSender;
pub use smtp::{SmtpConfig, SmtpSender};

use crate::error::NotificationResult;
use crate::models::{Email, SendResult};
use async_trait::async_trait;

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, email: &Email) -> NotificationResult<SendResult>;

    async fn health_check(&self) -> NotificationResult<()>;

    fn name(&self) -> &'static str;
}
