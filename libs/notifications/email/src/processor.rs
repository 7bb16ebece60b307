//! ReminderProcessor - the `StreamProcessor` for reminder jobs.

use crate::contact::ContactResolver;
use crate::error::NotificationError;
use crate::job::ReminderJob;
use crate::models::Email;
use crate::provider::NotificationSender;
use crate::templates::TemplateEngine;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use stream_worker::{StreamError, StreamProcessor};
use tracing::{debug, info, instrument};

/// Resolves the owner's address, renders the reminder and sends it.
pub struct ReminderProcessor<R: ContactResolver, S: NotificationSender> {
    contacts: Arc<R>,
    sender: Arc<S>,
    templates: Arc<TemplateEngine>,
    /// Links in emails point to `{app_url}/todos/{id}` when set.
    app_url: Option<String>,
}

impl<R: ContactResolver, S: NotificationSender> ReminderProcessor<R, S> {
    pub fn new(contacts: R, sender: S, templates: TemplateEngine) -> Self {
        Self {
            contacts: Arc::new(contacts),
            sender: Arc::new(sender),
            templates: Arc::new(templates),
            app_url: None,
        }
    }

    pub fn with_app_url(mut self, app_url: impl Into<String>) -> Self {
        self.app_url = Some(app_url.into().trim_end_matches('/').to_string());
        self
    }

    fn render(&self, job: &ReminderJob, name: &str) -> Result<(String, Option<String>, Option<String>), NotificationError> {
        let data = json!({
            "name": name,
            "title": job.todo_title,
            "due_date": job.due_date.format("%Y-%m-%d %H:%M UTC").to_string(),
            "todo_url": self.app_url.as_ref().map(|url| format!("{}/todos/{}", url, job.todo_id)),
        });
        let rendered = self.templates.render(job.kind.template_name(), &data)?;
        Ok((rendered.subject, rendered.body_text, rendered.body_html))
    }
}

#[async_trait]
impl<R, S> StreamProcessor<ReminderJob> for ReminderProcessor<R, S>
where
    R: ContactResolver + 'static,
    S: NotificationSender + 'static,
{
    #[instrument(skip(self, job), fields(job_id = %job.id, todo_id = %job.todo_id, kind = ?job.kind))]
    async fn process(&self, job: &ReminderJob) -> Result<(), StreamError> {
        let contact = self
            .contacts
            .resolve(&job.user_id)
            .await?
            .ok_or_else(|| NotificationError::NoContact(job.user_id.clone()))?;
        debug!(to = %contact.email, "Resolved contact");

        let greeting = contact.name.clone().unwrap_or_else(|| "there".to_string());
        let (subject, body_text, body_html) = self.render(job, &greeting)?;

        let mut email = Email::new(contact, subject);
        email.body_text = body_text;
        email.body_html = body_html;

        let result = self.sender.send(&email).await?;

        info!(
            message_id = %result.message_id,
            retry_count = job.retry_count,
            "Reminder sent"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "reminder_processor"
    }

    async fn health_check(&self) -> Result<bool, StreamError> {
        self.sender.health_check().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::InMemoryContactResolver;
    use crate::job::ReminderKind;
    use crate::models::Contact;
    use crate::provider::MockSender;
    use chrono::{TimeZone, Utc};
    use stream_worker::ErrorCategory;
    use uuid::Uuid;

    fn job(kind: ReminderKind, user: &str) -> ReminderJob {
        ReminderJob::new(
            kind,
            Uuid::nil(),
            user,
            "File taxes",
            Utc.with_ymd_and_hms(2026, 4, 15, 17, 0, 0).unwrap(),
        )
    }

    async fn processor(sender: MockSender) -> ReminderProcessor<InMemoryContactResolver, MockSender> {
        let contacts = InMemoryContactResolver::new();
        contacts
            .insert("alice", Contact::new("alice@example.com").with_name("Alice"))
            .await;
        ReminderProcessor::new(contacts, sender, TemplateEngine::new().unwrap())
            .with_app_url("https://todos.example.com/")
    }

    #[tokio::test]
    async fn test_sends_rendered_reminder_to_owner() {
        let sender = MockSender::new();
        let processor = processor(sender.clone()).await;

        processor
            .process(&job(ReminderKind::Overdue, "alice"))
            .await
            .unwrap();

        let sent = sender.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to.email, "alice@example.com");
        assert_eq!(sent[0].subject, "Overdue: \"File taxes\"");
        let text = sent[0].body_text.as_deref().unwrap();
        assert!(text.contains("Hello Alice,"));
        assert!(text.contains("2026-04-15 17:00 UTC"));
        assert!(text.contains(&format!(
            "https://todos.example.com/todos/{}",
            Uuid::nil()
        )));
    }

    #[tokio::test]
    async fn test_unknown_user_is_permanent_failure() {
        let sender = MockSender::new();
        let processor = processor(sender.clone()).await;

        let err = processor
            .process(&job(ReminderKind::DueSoon, "ghost"))
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Permanent);
        assert_eq!(sender.sent_count().await, 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_transient() {
        let processor = processor(MockSender::failing()).await;

        let err = processor
            .process(&job(ReminderKind::DueSoon, "alice"))
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Transient);
        assert!(err.should_retry(0, 3));
        assert!(!err.should_retry(2, 3));
    }

    #[test]
    fn test_processor_name() {
        let processor = ReminderProcessor::new(
            InMemoryContactResolver::new(),
            MockSender::new(),
            TemplateEngine::new().unwrap(),
        );
        assert_eq!(processor.name(), "reminder_processor");
    }
}
