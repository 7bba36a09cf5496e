// Scheduler engine: sleeps until the next cron fire time, then runs the
// pipeline. One engine drives one pipeline; overlap protection lives in the
// pipeline's run lock, so a slow run simply makes the next trigger a no-op.

use crate::config::Settings;
use crate::errors::{PipelineError, ScheduleError};
use crate::models::{RunStatus, TriggerSource};
use crate::pipeline::{PipelineRunner, RunContext};
use crate::schedule;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Configuration for the scheduler loop
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Upper bound on one sleep interval; long waits are chunked so a
    /// wall-clock jump cannot push a fire time far into the future
    pub max_sleep: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_sleep: Duration::from_secs(300),
        }
    }
}

/// Drives scheduled pipeline runs
pub struct SchedulerEngine {
    config: SchedulerConfig,
    settings: Settings,
    runner: Arc<PipelineRunner>,
    shutdown_tx: tokio::sync::broadcast::Sender<()>,
}

impl SchedulerEngine {
    pub fn new(config: SchedulerConfig, settings: Settings, runner: Arc<PipelineRunner>) -> Self {
        let (shutdown_tx, _shutdown_rx) = tokio::sync::broadcast::channel(1);
        Self {
            config,
            settings,
            runner,
            shutdown_tx,
        }
    }

    /// Get a shutdown signal receiver
    pub fn shutdown_receiver(&self) -> tokio::sync::broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Request a graceful stop; an in-flight run completes first
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Run the scheduling loop until stopped
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<(), ScheduleError> {
        // Fail fast on an unparseable expression instead of at first fire
        schedule::parse_cron_expression(&self.settings.schedule.cron_expression)?;

        let mut shutdown_rx = self.shutdown_receiver();
        info!(
            cron = %self.settings.schedule.cron_expression,
            timezone = %self.settings.schedule.timezone,
            "Scheduler started"
        );

        loop {
            let now = Utc::now();
            let next = schedule::next_execution(&self.settings.schedule, now)?;
            info!(next_run = %next, "Next scheduled run");

            // Sleep in bounded chunks until the fire time passes
            loop {
                let remaining = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
                if remaining.is_zero() {
                    break;
                }
                let chunk = remaining.min(self.config.max_sleep);
                tokio::select! {
                    _ = tokio::time::sleep(chunk) => {}
                    _ = shutdown_rx.recv() => {
                        info!("Scheduler stopping");
                        return Ok(());
                    }
                }
            }

            self.trigger_run().await;
        }
    }

    /// Execute one scheduled run, tolerating per-run failures
    async fn trigger_run(&self) {
        let mut ctx = RunContext::new(self.settings.clone());
        match self.runner.run(&mut ctx, TriggerSource::Scheduled).await {
            Ok(record) if record.status == RunStatus::Succeeded => {
                info!(run_id = %record.id, "Scheduled run succeeded");
            }
            Ok(record) => {
                let failed = record
                    .steps
                    .iter()
                    .find(|s| s.error.is_some())
                    .map(|s| s.name.clone())
                    .unwrap_or_default();
                error!(run_id = %record.id, step = %failed, "Scheduled run failed");
            }
            Err(PipelineError::AlreadyRunning) => {
                warn!("Previous run still in flight, skipping this trigger");
            }
            Err(e) => {
                error!(error = %e, "Scheduled run could not start");
            }
        }
    }
}
