// Scheduler binary entry point
//
// Daemon mode: waits for the configured cron fire time (09:30 UTC daily by
// default), then drives the checkout → signal → publish pipeline. Use the
// `runner` binary for a single immediate run.

use common::config::Settings;
use common::lock::RunLock;
use common::pipeline::PipelineRunner;
use common::scheduler::{SchedulerConfig, SchedulerEngine};
use common::telemetry;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    // Initialize tracing/logging and metrics
    telemetry::init_logging(
        &settings.observability.log_level,
        settings.observability.tracing_endpoint.as_deref(),
    )?;
    telemetry::init_metrics(settings.observability.metrics_port)?;

    info!("Starting NEPSE signals scheduler");
    info!(
        repository = %settings.repository.url,
        branch = %settings.repository.branch,
        cron = %settings.schedule.cron_expression,
        "Configuration loaded"
    );

    // Build the pipeline once; the engine reuses it for every run
    let runner = Arc::new(PipelineRunner::standard(&settings, RunLock::new()).map_err(|e| {
        error!(error = %e, "Failed to build pipeline");
        e
    })?);

    let engine = Arc::new(SchedulerEngine::new(
        SchedulerConfig::default(),
        settings,
        runner,
    ));

    // Graceful shutdown on Ctrl+C; an in-flight run completes first
    let engine_for_shutdown = engine.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        info!("Shutdown signal received, stopping scheduler");
        engine_for_shutdown.stop();
    });

    if let Err(e) = engine.start().await {
        error!(error = %e, "Scheduler error");
        telemetry::shutdown_tracer();
        return Err(e.into());
    }

    info!("Scheduler stopped");
    telemetry::shutdown_tracer();
    Ok(())
}
