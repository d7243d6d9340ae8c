use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use domain::services::notification::NotificationService;
use leads_api::app::{router, AppState};
use leads_api::config::Config;
use leads_api::jobs::{FollowupReminderJob, JobScheduler, PoolMetricsJob};
use leads_api::middleware::{init_metrics, logging::init_logging};
use leads_api::services::EmailService;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load().context("failed to load configuration")?;

    init_logging(&config.logging);

    info!("Starting Leads CRM API v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = init_metrics() {
        warn!(error = %e, "Prometheus recorder not installed, /metrics will be unavailable");
    }

    let pool = persistence::db::create_pool(&(&config.database).into())
        .await
        .context("failed to connect to the database")?;

    persistence::db::run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;
    info!("Migrations completed");

    let notifier: Arc<dyn NotificationService> = Arc::new(EmailService::new(config.email.clone()));
    let addr = config.socket_addr().context("invalid server address")?;
    let state = AppState::new(config, pool.clone(), notifier.clone());

    let mut scheduler = JobScheduler::new();
    scheduler.register(PoolMetricsJob::new(pool.clone(), state.rate_limiter.clone()));
    if state.config.jobs.enabled {
        scheduler.register(FollowupReminderJob::new(
            pool.clone(),
            notifier,
            state.config.crm.default_academic_year.clone(),
            state.config.jobs.reminder_interval_minutes,
        ));
    }
    scheduler.start();

    let app = router(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(30)).await;
    pool.close().await;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
