//! Where scheduled jobs put their reminders.

use async_trait::async_trait;
use email::ReminderJob;
use std::collections::HashSet;
use std::sync::Arc;
use stream_worker::{QueueTier, StreamError, StreamProducer};
use tokio::sync::Mutex;
use uuid::Uuid;

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Durably queue `job` on its tier and return the entry id.
    async fn push(&self, job: &ReminderJob) -> Result<String, StreamError>;
}

#[async_trait]
impl JobQueue for StreamProducer {
    async fn push(&self, job: &ReminderJob) -> Result<String, StreamError> {
        self.enqueue(job, job.tier()).await
    }
}

/// Records pushed jobs; pushes for chosen todos can be made to fail.
#[derive(Clone, Default)]
pub struct InMemoryJobQueue {
    jobs: Arc<Mutex<Vec<(QueueTier, ReminderJob)>>>,
    failing: Arc<Mutex<HashSet<Uuid>>>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_for(&self, todo_id: Uuid) {
        self.failing.lock().await.insert(todo_id);
    }

    pub async fn jobs(&self) -> Vec<(QueueTier, ReminderJob)> {
        self.jobs.lock().await.clone()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn push(&self, job: &ReminderJob) -> Result<String, StreamError> {
        if self.failing.lock().await.contains(&job.todo_id) {
            return Err(StreamError::transient("queue unavailable"));
        }
        let mut jobs = self.jobs.lock().await;
        jobs.push((job.tier(), job.clone()));
        Ok(format!("0-{}", jobs.len()))
    }
}
