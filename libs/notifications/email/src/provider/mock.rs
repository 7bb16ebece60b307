//! Recording sender for tests

use super::NotificationSender;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{Email, SendResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Mutex;

/// Captures sent emails. Can fail a number of sends before succeeding.
#[derive(Clone, Default)]
pub struct MockSender {
    sent: Arc<Mutex<Vec<Email>>>,
    failures_left: Arc<AtomicU32>,
}

impl MockSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every send.
    pub fn failing() -> Self {
        Self::failing_times(u32::MAX)
    }

    /// Fail the next `times` sends with a provider error.
    pub fn failing_times(times: u32) -> Self {
        let sender = Self::new();
        sender.failures_left.store(times, Ordering::SeqCst);
        sender
    }

    pub async fn sent(&self) -> Vec<Email> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn was_sent_to(&self, address: &str) -> bool {
        self.sent.lock().await.iter().any(|e| e.to.email == address)
    }
}

#[async_trait]
impl NotificationSender for MockSender {
    async fn send(&self, email: &Email) -> NotificationResult<SendResult> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(NotificationError::Provider("mock failure".to_string()));
        }

        let mut sent = self.sent.lock().await;
        sent.push(email.clone());
        Ok(SendResult {
            message_id: format!("mock-{}", sent.len()),
        })
    }

    async fn health_check(&self) -> NotificationResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Contact;

    fn email() -> Email {
        Email::new(Contact::new("test@example.com"), "Subject").with_text("Body")
    }

    #[tokio::test]
    async fn test_records_sent_email() {
        let sender = MockSender::new();
        let result = sender.send(&email()).await.unwrap();
        assert_eq!(result.message_id, "mock-1");
        assert!(sender.was_sent_to("test@example.com").await);
        assert!(!sender.was_sent_to("other@example.com").await);
    }

    #[tokio::test]
    async fn test_fails_then_recovers() {
        let sender = MockSender::failing_times(2);
        assert!(sender.send(&email()).await.is_err());
        assert!(sender.send(&email()).await.is_err());
        assert!(sender.send(&email()).await.is_ok());
        assert_eq!(sender.sent_count().await, 1);
    }
}
