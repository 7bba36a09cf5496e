// Runner binary entry point
//
// Executes exactly one pipeline run and exits with its status: 0 when the
// run succeeds (including the clean-tree publish no-op), 1 when any step
// fails. This is the surface a CI job invokes.

use common::config::Settings;
use common::lock::RunLock;
use common::models::{RunStatus, TriggerSource};
use common::pipeline::{PipelineRunner, RunContext};
use common::telemetry;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    telemetry::init_logging(
        &settings.observability.log_level,
        settings.observability.tracing_endpoint.as_deref(),
    )?;

    info!("Starting NEPSE signals runner");

    let runner = PipelineRunner::standard(&settings, RunLock::new()).map_err(|e| {
        error!(error = %e, "Failed to build pipeline");
        e
    })?;

    let mut ctx = RunContext::new(settings);
    let record = runner.run(&mut ctx, TriggerSource::Manual).await?;

    telemetry::shutdown_tracer();

    match record.status {
        RunStatus::Succeeded => {
            info!(run_id = %record.id, stocks = ctx.stocks_analyzed, "Run succeeded");
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            let failed = record
                .steps
                .iter()
                .find(|s| s.error.is_some())
                .map(|s| s.name.clone())
                .unwrap_or_default();
            error!(run_id = %record.id, step = %failed, "Run failed");
            Ok(ExitCode::FAILURE)
        }
    }
}
