//! ReminderJob - the work item carried on the reminder queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stream_worker::{QueueTier, StreamJob};
use uuid::Uuid;

/// Which reminder to send; selects the template and the queue tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    DueSoon,
    Overdue,
}

impl ReminderKind {
    pub fn template_name(&self) -> &'static str {
        match self {
            ReminderKind::DueSoon => "due_soon",
            ReminderKind::Overdue => "overdue",
        }
    }

    /// Overdue notices jump the queue.
    pub fn tier(&self) -> QueueTier {
        match self {
            ReminderKind::DueSoon => QueueTier::Default,
            ReminderKind::Overdue => QueueTier::Critical,
        }
    }
}

/// One reminder for one todo, addressed to its owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReminderJob {
    pub id: Uuid,
    pub todo_id: Uuid,
    /// Owning principal; resolved to an address by the consumer.
    pub user_id: String,
    pub kind: ReminderKind,
    pub todo_title: String,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub retry_count: u32,
    pub created_at: DateTime<Utc>,
}

impl ReminderJob {
    pub fn new(
        kind: ReminderKind,
        todo_id: Uuid,
        user_id: impl Into<String>,
        todo_title: impl Into<String>,
        due_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            todo_id,
            user_id: user_id.into(),
            kind,
            todo_title: todo_title.into(),
            due_date,
            retry_count: 0,
            created_at: Utc::now(),
        }
    }

    pub fn tier(&self) -> QueueTier {
        self.kind.tier()
    }
}

impl StreamJob for ReminderJob {
    fn job_id(&self) -> String {
        self.id.to_string()
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
