//! Scheduled jobs: pick todos by due date and queue one reminder per todo.
//!
//! A run keeps no cursor. Overlapping or repeated runs may queue the same
//! todo twice; a failed push is logged and the rest of the batch continues.

use chrono::{DateTime, Duration, Utc};
use domain_todos::{DueTodo, DueTodoSource, DueWindow, TodoResult};
use email::{ReminderJob, ReminderKind};
use metrics::counter;
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use crate::queue::JobQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScheduledJob {
    DueSoon,
    Overdue,
}

impl ScheduledJob {
    pub fn name(&self) -> &'static str {
        match self {
            ScheduledJob::DueSoon => "due_soon_reminders",
            ScheduledJob::Overdue => "overdue_notifications",
        }
    }

    fn kind(&self) -> ReminderKind {
        match self {
            ScheduledJob::DueSoon => ReminderKind::DueSoon,
            ScheduledJob::Overdue => ReminderKind::Overdue,
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobRunReport {
    pub selected: usize,
    pub enqueued: usize,
    pub failed: usize,
}

async fn enqueue_each(job: ScheduledJob, todos: Vec<DueTodo>, queue: &dyn JobQueue) -> JobRunReport {
    let mut report = JobRunReport {
        selected: todos.len(),
        ..Default::default()
    };

    for todo in todos {
        let reminder = ReminderJob::new(job.kind(), todo.id, todo.user_id, todo.title, todo.due_date);
        match queue.push(&reminder).await {
            Ok(entry_id) => {
                report.enqueued += 1;
                debug!(todo_id = %todo.id, %entry_id, "reminder queued");
            }
            Err(e) => {
                report.failed += 1;
                error!(job = job.name(), todo_id = %todo.id, error = %e, "failed to queue reminder");
            }
        }
    }

    counter!("scheduled_job_reminders_total", "job" => job.name(), "outcome" => "enqueued")
        .increment(report.enqueued as u64);
    counter!("scheduled_job_reminders_total", "job" => job.name(), "outcome" => "failed")
        .increment(report.failed as u64);
    report
}

/// Open todos due in `(now, now + window]`, queued as `DueSoon` on the default tier.
#[instrument(skip(source, queue))]
pub async fn due_soon_reminders(
    now: DateTime<Utc>,
    source: &dyn DueTodoSource,
    queue: &dyn JobQueue,
    window: Duration,
    limit: u64,
) -> TodoResult<JobRunReport> {
    let due = source
        .due_todos(
            DueWindow {
                after: Some(now),
                until: now + window,
            },
            limit,
        )
        .await?;

    let report = enqueue_each(ScheduledJob::DueSoon, due, queue).await;
    info!(
        job = ScheduledJob::DueSoon.name(),
        selected = report.selected,
        enqueued = report.enqueued,
        failed = report.failed,
        "scheduled job finished"
    );
    Ok(report)
}

/// Open todos due at or before `now`, queued as `Overdue` on the critical tier.
#[instrument(skip(source, queue))]
pub async fn overdue_notifications(
    now: DateTime<Utc>,
    source: &dyn DueTodoSource,
    queue: &dyn JobQueue,
    limit: u64,
) -> TodoResult<JobRunReport> {
    let due = source
        .due_todos(DueWindow::overdue(now), limit)
        .await?;

    let report = enqueue_each(ScheduledJob::Overdue, due, queue).await;
    info!(
        job = ScheduledJob::Overdue.name(),
        selected = report.selected,
        enqueued = report.enqueued,
        failed = report.failed,
        "scheduled job finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::InMemoryJobQueue;
    use domain_todos::models::{NewTodo, now_micros};
    use domain_todos::{
        CreateTodo, InMemoryTodoRepository, Todo, TodoFilter, TodoRepository, TodoStatus,
    };
    use stream_worker::QueueTier;

    async fn seed(
        repo: &InMemoryTodoRepository,
        title: &str,
        due: Option<DateTime<Utc>>,
        status: TodoStatus,
    ) -> Todo {
        let mut input = NewTodo::from_create(
            "alice",
            CreateTodo {
                title: title.into(),
                ..Default::default()
            },
            now_micros(),
        );
        input.status = status;
        input.due_date = due;
        repo.create(input).await.unwrap()
    }

    #[tokio::test]
    async fn test_due_soon_queues_open_todos_in_window() {
        let repo = InMemoryTodoRepository::new();
        let queue = InMemoryJobQueue::new();
        let now = now_micros();

        seed(&repo, "tomorrow", Some(now + Duration::hours(20)), TodoStatus::Active).await;
        seed(&repo, "in an hour", Some(now + Duration::hours(1)), TodoStatus::Draft).await;
        seed(&repo, "next week", Some(now + Duration::days(7)), TodoStatus::Active).await;
        seed(&repo, "finished", Some(now + Duration::hours(2)), TodoStatus::Completed).await;
        seed(&repo, "no date", None, TodoStatus::Active).await;
        seed(&repo, "late", Some(now - Duration::hours(1)), TodoStatus::Active).await;

        let report = due_soon_reminders(now, &repo, &queue, Duration::hours(24), 100)
            .await
            .unwrap();

        assert_eq!(
            report,
            JobRunReport {
                selected: 2,
                enqueued: 2,
                failed: 0
            }
        );
        let jobs = queue.jobs().await;
        let titles: Vec<_> = jobs.iter().map(|(_, j)| j.todo_title.as_str()).collect();
        assert_eq!(titles, vec!["in an hour", "tomorrow"]);
        assert!(jobs.iter().all(|(tier, j)| {
            *tier == QueueTier::Default && j.kind == ReminderKind::DueSoon && j.user_id == "alice"
        }));
    }

    #[tokio::test]
    async fn test_overdue_queues_on_critical_tier() {
        let repo = InMemoryTodoRepository::new();
        let queue = InMemoryJobQueue::new();
        let now = now_micros();

        let late = seed(&repo, "late", Some(now - Duration::days(2)), TodoStatus::Active).await;
        seed(&repo, "upcoming", Some(now + Duration::hours(3)), TodoStatus::Active).await;
        seed(&repo, "archived", Some(now - Duration::days(1)), TodoStatus::Archived).await;

        let report = overdue_notifications(now, &repo, &queue, 100).await.unwrap();

        assert_eq!(report.selected, 1);
        let jobs = queue.jobs().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].0, QueueTier::Critical);
        assert_eq!(jobs[0].1.todo_id, late.id());
        assert_eq!(jobs[0].1.kind, ReminderKind::Overdue);
    }

    #[tokio::test]
    async fn test_todo_due_exactly_now_is_overdue_everywhere() {
        let repo = InMemoryTodoRepository::new();
        let queue = InMemoryJobQueue::new();
        let now = now_micros();
        let due_now = seed(&repo, "due now", Some(now), TodoStatus::Active).await;

        let report = overdue_notifications(now, &repo, &queue, 100).await.unwrap();
        assert_eq!(report.selected, 1);

        let listed = TodoFilter {
            overdue: Some(true),
            ..Default::default()
        };
        assert!(listed.matches(&due_now, now));
        assert!(due_now.is_overdue(now));

        let soon = due_soon_reminders(now, &repo, &queue, Duration::hours(24), 100)
            .await
            .unwrap();
        assert_eq!(soon.selected, 0);
    }

    #[tokio::test]
    async fn test_batch_cap_limits_selection() {
        let repo = InMemoryTodoRepository::new();
        let queue = InMemoryJobQueue::new();
        let now = now_micros();
        for hours in 1..=5 {
            seed(&repo, "late", Some(now - Duration::hours(hours)), TodoStatus::Active).await;
        }

        let report = overdue_notifications(now, &repo, &queue, 3).await.unwrap();
        assert_eq!(report.selected, 3);
        assert_eq!(queue.jobs().await.len(), 3);
    }

    #[tokio::test]
    async fn test_push_failure_does_not_abort_batch() {
        let repo = InMemoryTodoRepository::new();
        let queue = InMemoryJobQueue::new();
        let now = now_micros();

        let first = seed(&repo, "first", Some(now - Duration::hours(3)), TodoStatus::Active).await;
        seed(&repo, "second", Some(now - Duration::hours(2)), TodoStatus::Active).await;
        seed(&repo, "third", Some(now - Duration::hours(1)), TodoStatus::Active).await;
        queue.fail_for(first.id()).await;

        let report = overdue_notifications(now, &repo, &queue, 100).await.unwrap();

        assert_eq!(
            report,
            JobRunReport {
                selected: 3,
                enqueued: 2,
                failed: 1
            }
        );
        let titles: Vec<_> = queue
            .jobs()
            .await
            .into_iter()
            .map(|(_, j)| j.todo_title)
            .collect();
        assert_eq!(titles, vec!["second", "third"]);
    }

    #[tokio::test]
    async fn test_repeated_runs_queue_again() {
        let repo = InMemoryTodoRepository::new();
        let queue = InMemoryJobQueue::new();
        let now = now_micros();
        seed(&repo, "late", Some(now - Duration::hours(1)), TodoStatus::Active).await;

        overdue_notifications(now, &repo, &queue, 100).await.unwrap();
        overdue_notifications(now, &repo, &queue, 100).await.unwrap();

        assert_eq!(queue.jobs().await.len(), 2);
    }
}
