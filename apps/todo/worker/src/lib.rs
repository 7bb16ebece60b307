//! Todo Worker
//!
//! Delivers due-date reminders and runs the jobs that produce them.
//!
//! ## Architecture
//!
//! ```text
//! tokio-cron-scheduler
//!   ├─ due_soon_reminders ──┐            (default tier)
//!   └─ overdue_notifications┴─► StreamProducer ─► Redis Streams todo:notifications:<tier>
//!                                                     ↓ (consumer group notification_workers)
//!                                  StreamWorker<ReminderJob, ReminderProcessor>
//!                                                     ↓
//!                          ContactResolver ─► TemplateEngine ─► NotificationSender (SMTP)
//! ```
//!
//! `consume` runs the stream consumer, `schedule` the cron jobs, `all` both in
//! one process. `trigger` runs a single job once and prints its report.

pub mod config;
pub mod context;
pub mod health;
pub mod jobs;
pub mod queue;
pub mod scheduler;

use clap::{Parser, Subcommand};
use core_config::FromEnv;
use core_config::tracing::init_tracing;
use domain_todos::{DueTodoSource, PgTodoRepository};
use email::{HttpContactResolver, ReminderJob, ReminderProcessor, SmtpSender, TemplateEngine};
use eyre::WrapErr;
use std::sync::Arc;
use stream_worker::{HealthState, StreamProducer, StreamWorker, init_metrics};
use tokio::sync::watch;
use tracing::{info, warn};

use config::{Config, NotifierConfig};
use context::WorkerContext;
use jobs::ScheduledJob;
use queue::JobQueue;

#[derive(Debug, Parser)]
#[command(name = "todo_worker")]
#[command(about = "Reminder dispatch consumer and scheduled due-date jobs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Consume reminder jobs from the queue and send emails
    Consume,
    /// Run the cron jobs that queue reminders
    Schedule,
    /// Consumer and scheduler in one process
    All,
    /// Run one scheduled job now and print its report
    Trigger {
        #[arg(value_enum)]
        job: ScheduledJob,
    },
}

impl Command {
    fn consumes(&self) -> bool {
        matches!(self, Command::Consume | Command::All)
    }

    fn schedules(&self) -> bool {
        matches!(self, Command::Schedule | Command::All)
    }
}

async fn consume(ctx: &WorkerContext, shutdown: watch::Receiver<bool>) -> eyre::Result<()> {
    let notifier = NotifierConfig::from_env().wrap_err("failed to load notifier configuration")?;
    let contacts = HttpContactResolver::new(notifier.contact)?;
    let sender = SmtpSender::new(notifier.smtp)?;
    let mut processor = ReminderProcessor::new(contacts, sender, TemplateEngine::new()?);
    if let Some(url) = &ctx.config.app_url {
        processor = processor.with_app_url(url);
    }

    let worker_config = ctx.config.queue.worker_config();
    info!(
        queue = %worker_config.queue_name,
        consumer_group = %worker_config.consumer_group,
        consumer_id = %worker_config.consumer_id,
        batch_size = worker_config.batch_size,
        max_retries = worker_config.max_retries,
        "starting reminder consumer"
    );

    StreamWorker::<ReminderJob, _>::new(ctx.redis.clone(), processor, worker_config)
        .run(shutdown)
        .await?;
    Ok(())
}

fn job_source(ctx: &WorkerContext) -> Arc<dyn DueTodoSource> {
    Arc::new(PgTodoRepository::new(ctx.db.clone()))
}

fn job_queue(ctx: &WorkerContext) -> Arc<dyn JobQueue> {
    Arc::new(StreamProducer::new(
        ctx.redis.clone(),
        &ctx.config.queue.name,
    ))
}

async fn schedule(ctx: &WorkerContext, shutdown: watch::Receiver<bool>) -> eyre::Result<()> {
    scheduler::run_scheduler(job_source(ctx), job_queue(ctx), &ctx.config.schedule, shutdown).await
}

async fn trigger(ctx: &WorkerContext, job: ScheduledJob) -> eyre::Result<()> {
    let source = job_source(ctx);
    let queue = job_queue(ctx);
    let report =
        scheduler::run_job(job, source.as_ref(), queue.as_ref(), &ctx.config.schedule).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_services(ctx: &WorkerContext, command: Command) -> eyre::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        axum_helpers::shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let health = HealthState::new(
        ctx.redis.clone(),
        ctx.config.app.name,
        ctx.config.app.version,
        ctx.config.queue.name.clone(),
    );

    let consumer = async {
        if command.consumes() {
            consume(ctx, shutdown_rx.clone()).await
        } else {
            Ok(())
        }
    };
    let scheduler = async {
        if command.schedules() {
            schedule(ctx, shutdown_rx.clone()).await
        } else {
            Ok(())
        }
    };

    tokio::try_join!(
        health::serve_health(health, ctx.config.health_port, shutdown_rx.clone()),
        consumer,
        scheduler,
    )?;
    Ok(())
}

/// Loads configuration, connects, and runs `command` until it finishes or a
/// shutdown signal arrives.
pub async fn run(command: Command) -> eyre::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.environment);

    if let Err(e) = init_metrics() {
        warn!(error = %e, "metrics recorder not installed");
    }

    info!(
        name = config.app.name,
        version = config.app.version,
        ?command,
        "starting todo worker"
    );

    let ctx = WorkerContext::connect(config).await?;
    let result = match command {
        Command::Trigger { job } => trigger(&ctx, job).await,
        _ => run_services(&ctx, command).await,
    };

    ctx.shutdown().await;
    info!("todo worker stopped");
    result
}
