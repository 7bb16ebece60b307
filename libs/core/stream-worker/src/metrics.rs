//! Prometheus metrics for stream workers
//!
//! Provides observability into worker performance and health.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::time::Duration;
use tracing::info;

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize Prometheus metrics
///
/// Call this once at startup. Subsequent calls are no-ops.
pub fn init_metrics() -> Result<(), BuildError> {
    PROMETHEUS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;
        info!("Prometheus metrics initialized");
        Ok::<_, BuildError>(handle)
    })?;
    Ok(())
}

/// Get the Prometheus handle for rendering metrics
pub fn prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// Render metrics in Prometheus format
pub fn render_metrics() -> String {
    prometheus_handle().map(|h| h.render()).unwrap_or_default()
}

/// Stream worker metrics helper
#[derive(Clone)]
pub struct StreamMetrics {
    queue_name: String,
    processor_name: String,
}

impl StreamMetrics {
    pub fn new(queue_name: impl Into<String>, processor_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            processor_name: processor_name.into(),
        }
    }

    pub fn job_received(&self, tier: &str) {
        counter!(
            "stream_worker_jobs_received_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone(),
            "tier" => tier.to_string()
        )
        .increment(1);
    }

    pub fn job_processed(&self, tier: &str, duration: Duration) {
        counter!(
            "stream_worker_jobs_processed_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone(),
            "tier" => tier.to_string(),
            "status" => "success"
        )
        .increment(1);

        histogram!(
            "stream_worker_job_duration_seconds",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .record(duration.as_secs_f64());
    }

    pub fn job_failed(&self, tier: &str, category: &str) {
        counter!(
            "stream_worker_jobs_processed_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone(),
            "tier" => tier.to_string(),
            "status" => "failed"
        )
        .increment(1);

        counter!(
            "stream_worker_job_errors_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone(),
            "category" => category.to_string()
        )
        .increment(1);
    }

    pub fn job_retried(&self, tier: &str) {
        counter!(
            "stream_worker_jobs_retried_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone(),
            "tier" => tier.to_string()
        )
        .increment(1);
    }

    /// Record a job abandoned after its last attempt or a permanent failure
    pub fn job_dropped(&self, tier: &str, reason: &str) {
        counter!(
            "stream_worker_jobs_dropped_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone(),
            "tier" => tier.to_string(),
            "reason" => reason.to_string()
        )
        .increment(1);
    }

    pub fn messages_claimed(&self, tier: &str, count: usize) {
        counter!(
            "stream_worker_messages_claimed_total",
            "queue" => self.queue_name.clone(),
            "tier" => tier.to_string()
        )
        .increment(count as u64);
    }

    pub fn batch_size(&self, size: usize) {
        histogram!(
            "stream_worker_batch_size",
            "queue" => self.queue_name.clone()
        )
        .record(size as f64);
    }

    pub fn stream_depth(&self, tier: &str, depth: u64) {
        gauge!(
            "stream_worker_stream_depth",
            "queue" => self.queue_name.clone(),
            "tier" => tier.to_string()
        )
        .set(depth as f64);
    }
}
