use eyre::WrapErr;
use stream_worker::{HealthState, health_router};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

/// `/health`, `/ready`, `/queue/info` and `/metrics` on `port`, until shutdown.
pub async fn serve_health(
    state: HealthState,
    port: u16,
    mut shutdown: watch::Receiver<bool>,
) -> eyre::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("failed to bind health server to {addr}"))?;
    info!(%port, "health server listening");

    axum::serve(listener, health_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .wrap_err("health server failed")
}
