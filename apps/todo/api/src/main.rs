use axum_helpers::{create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_todos::ApiDoc;
use std::time::Duration;
use tracing::info;

mod config;
mod context;
mod routes;

use config::Config;
use context::AppContext;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Before anything fallible, so startup errors are rendered by color-eyre
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);
    info!(
        name = config.app.name,
        version = config.app.version,
        environment = ?config.environment,
        "starting todo API"
    );

    let ctx = AppContext::connect(config).await?;

    database::postgres::run_migrations::<migration::Migrator>(&ctx.db, ctx.config.app.name)
        .await
        .map_err(|e| eyre::eyre!("migrations failed: {e}"))?;

    let router = create_router::<ApiDoc>(routes::api(&ctx), &ctx.config.server)?;

    // /health is liveness only, /ready pings the stores, /files serves signed downloads
    let app = router
        .merge(health_router(ctx.config.app))
        .merge(routes::ready_router(ctx.clone()))
        .merge(routes::files_router(ctx.objects.clone()));

    let server = ctx.config.server.clone();
    create_production_app(app, &server, SHUTDOWN_TIMEOUT, async move {
        info!("shutting down: closing connections");
        ctx.shutdown().await;
    })
    .await
    .map_err(|e| eyre::eyre!("server error: {e}"))?;

    info!("todo API stopped");
    Ok(())
}
