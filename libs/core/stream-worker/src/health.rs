//! Health check handlers for stream workers.
//!
//! - Liveness probe (`/health`)
//! - Readiness probe (`/ready`)
//! - Queue depth per tier (`/queue/info`)
//! - Prometheus metrics (`/metrics`)

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::metrics;
use crate::registry::QueueTier;

/// Shared state for health endpoints.
#[derive(Clone)]
pub struct HealthState {
    pub redis: ConnectionManager,
    pub app_name: String,
    pub app_version: String,
    pub queue_name: String,
}

impl HealthState {
    pub fn new(
        redis: ConnectionManager,
        app_name: impl Into<String>,
        app_version: impl Into<String>,
        queue_name: impl Into<String>,
    ) -> Self {
        Self {
            redis,
            app_name: app_name.into(),
            app_version: app_version.into(),
            queue_name: queue_name.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub name: String,
    pub version: String,
}

/// Liveness probe handler. Always OK while the process serves requests.
pub async fn health_handler(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        name: state.app_name,
        version: state.app_version,
    })
}

/// Readiness probe handler; checks Redis with PING.
pub async fn ready_handler(State(state): State<HealthState>) -> (StatusCode, Json<Value>) {
    let mut conn = state.redis.clone();
    let result: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;

    match result {
        Ok(response) if response == "PONG" => (
            StatusCode::OK,
            Json(json!({ "status": "ready", "checks": { "redis": "ok" } })),
        ),
        Ok(response) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "checks": { "redis": format!("unexpected response: {}", response) }
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Redis readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "not_ready", "checks": { "redis": "unavailable" } })),
            )
        }
    }
}

/// Length of every tier stream.
pub async fn queue_info_handler(State(state): State<HealthState>) -> (StatusCode, Json<Value>) {
    let mut conn = state.redis.clone();
    let mut tiers = serde_json::Map::new();

    for tier in QueueTier::all() {
        let len: Result<u64, _> = conn.xlen(tier.stream_key(&state.queue_name)).await;
        match len {
            Ok(len) => {
                tiers.insert(tier.to_string(), json!(len));
            }
            Err(e) => {
                tracing::warn!(error = %e, tier = %tier, "Failed to read stream length");
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "error": "redis unavailable" })),
                );
            }
        }
    }

    (
        StatusCode::OK,
        Json(json!({ "queue": state.queue_name, "tiers": tiers })),
    )
}

/// Prometheus scrape endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    match metrics::prometheus_handle() {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            handle.render(),
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            "Metrics not initialized".to_string(),
        )
            .into_response(),
    }
}

/// Router with `/health`, `/ready`, `/queue/info` and `/metrics`.
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/queue/info", get(queue_info_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}
