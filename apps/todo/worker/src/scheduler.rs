//! Cron wiring for the scheduled jobs.

use chrono::Utc;
use domain_todos::DueTodoSource;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{error, info};

use crate::config::ScheduleConfig;
use crate::jobs::{JobRunReport, ScheduledJob, due_soon_reminders, overdue_notifications};
use crate::queue::JobQueue;

/// Runs one job against the current time and logs the outcome.
pub async fn run_job(
    job: ScheduledJob,
    source: &dyn DueTodoSource,
    queue: &dyn JobQueue,
    config: &ScheduleConfig,
) -> eyre::Result<JobRunReport> {
    let now = Utc::now();
    let report = match job {
        ScheduledJob::DueSoon => {
            due_soon_reminders(now, source, queue, config.due_soon_window, config.batch_size)
                .await?
        }
        ScheduledJob::Overdue => {
            overdue_notifications(now, source, queue, config.batch_size).await?
        }
    };
    Ok(report)
}

/// One cron job per [`ScheduledJob`], sharing the same source and queue.
pub fn reminder_jobs(
    source: Arc<dyn DueTodoSource>,
    queue: Arc<dyn JobQueue>,
    config: &ScheduleConfig,
) -> Result<Vec<Job>, JobSchedulerError> {
    [
        (ScheduledJob::DueSoon, config.due_soon_cron.as_str()),
        (ScheduledJob::Overdue, config.overdue_cron.as_str()),
    ]
    .into_iter()
    .map(|(kind, cron)| {
        let source = source.clone();
        let queue = queue.clone();
        let config = config.clone();
        Job::new_async(cron, move |_id, _scheduler| {
            let source = source.clone();
            let queue = queue.clone();
            let config = config.clone();
            Box::pin(async move {
                if let Err(e) = run_job(kind, source.as_ref(), queue.as_ref(), &config).await {
                    error!(job = kind.name(), error = %e, "scheduled job failed");
                }
            })
        })
    })
    .collect()
}

/// Starts the scheduler and keeps it running until `shutdown` flips to true.
pub async fn run_scheduler(
    source: Arc<dyn DueTodoSource>,
    queue: Arc<dyn JobQueue>,
    config: &ScheduleConfig,
    mut shutdown: watch::Receiver<bool>,
) -> eyre::Result<()> {
    let mut scheduler = JobScheduler::new().await?;
    for job in reminder_jobs(source, queue, config)? {
        scheduler.add(job).await?;
    }
    scheduler.start().await?;
    info!(
        due_soon = %config.due_soon_cron,
        overdue = %config.overdue_cron,
        "scheduler started"
    );

    let _ = shutdown.wait_for(|stop| *stop).await;

    scheduler.shutdown().await?;
    info!("scheduler stopped");
    Ok(())
}
