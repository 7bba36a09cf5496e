// Pipeline engine: the fixed checkout → signal → publish sequence
//
// Steps run strictly in declared order; the first failure aborts the rest.
// There is no retry and no rollback of earlier steps. A trigger that fires
// while another run holds the lock is rejected, not queued.

pub mod steps;

pub use steps::{CheckoutStep, PublishStep, SignalStep};

use crate::config::{SecretString, Settings};
use crate::errors::PipelineError;
use crate::lock::RunLock;
use crate::models::{RunRecord, RunStatus, StepStatus, TriggerSource};
use crate::telemetry;
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, instrument};

/// How a step finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    /// The step had nothing to do; carries the reason for the run record
    Skipped(String),
}

/// One stage of the pipeline
#[async_trait]
pub trait PipelineStep: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, ctx: &mut RunContext) -> anyhow::Result<StepOutcome>;
}

/// Mutable state threaded through the steps of one run
pub struct RunContext {
    pub settings: Settings,
    pub api_key: Option<SecretString>,
    pub push_token: Option<SecretString>,
    workspace: Option<PathBuf>,
    pub report_paths: Vec<PathBuf>,
    pub stocks_analyzed: usize,
}

impl RunContext {
    /// Build a context with secrets drawn from the process environment
    pub fn new(settings: Settings) -> Self {
        let api_key = settings.api_key();
        let push_token = settings.push_token();
        Self {
            settings,
            api_key,
            push_token,
            workspace: None,
            report_paths: Vec::new(),
            stocks_analyzed: 0,
        }
    }

    /// Record the checked-out workspace path
    pub fn set_workspace(&mut self, path: PathBuf) {
        self.workspace = Some(path);
    }

    /// Workspace path; an error before the checkout step has run
    pub fn workspace(&self) -> anyhow::Result<&Path> {
        self.workspace
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("workspace not checked out yet"))
    }
}

/// Executes the declared steps in order, abort-on-error
pub struct PipelineRunner {
    steps: Vec<Box<dyn PipelineStep>>,
    lock: RunLock,
}

impl PipelineRunner {
    pub fn new(steps: Vec<Box<dyn PipelineStep>>, lock: RunLock) -> Self {
        Self { steps, lock }
    }

    /// The standard three-step pipeline from configuration
    pub fn standard(settings: &Settings, lock: RunLock) -> anyhow::Result<Self> {
        let steps: Vec<Box<dyn PipelineStep>> = vec![
            Box::new(CheckoutStep::from_settings(settings)),
            Box::new(SignalStep::from_settings(settings)?),
            Box::new(PublishStep::from_settings(settings)),
        ];
        Ok(Self::new(steps, lock))
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Execute one run
    ///
    /// Returns the run record; a failed step leaves its successors Pending
    /// and marks the run Failed. Err is reserved for the overlap guard.
    #[instrument(skip(self, ctx))]
    pub async fn run(
        &self,
        ctx: &mut RunContext,
        trigger: TriggerSource,
    ) -> Result<RunRecord, PipelineError> {
        let Some(_guard) = self.lock.try_acquire() else {
            return Err(PipelineError::AlreadyRunning);
        };

        let names = self.step_names();
        let mut record = RunRecord::new(trigger, &names);
        let started = Instant::now();
        info!(run_id = %record.id, trigger = ?trigger, "Pipeline run started");

        let mut failure: Option<PipelineError> = None;

        for (index, step) in self.steps.iter().enumerate() {
            let name = step.name();
            record.steps[index].status = StepStatus::Running;
            record.steps[index].started_at = Some(Utc::now());
            info!(run_id = %record.id, step = name, "Step started");

            match step.execute(ctx).await {
                Ok(StepOutcome::Completed) => {
                    record.steps[index].status = StepStatus::Succeeded;
                    record.steps[index].completed_at = Some(Utc::now());
                    info!(run_id = %record.id, step = name, "Step succeeded");
                }
                Ok(StepOutcome::Skipped(reason)) => {
                    record.steps[index].status = StepStatus::Skipped;
                    record.steps[index].completed_at = Some(Utc::now());
                    info!(run_id = %record.id, step = name, reason = %reason, "Step skipped");
                }
                Err(e) => {
                    let err = PipelineError::step(name, e);
                    error!(run_id = %record.id, error = %err, "Step failed");
                    record.steps[index].status = StepStatus::Failed;
                    record.steps[index].completed_at = Some(Utc::now());
                    record.steps[index].error = Some(err.to_string());
                    failure = Some(err);
                    break;
                }
            }
        }

        record.completed_at = Some(Utc::now());
        let duration = started.elapsed().as_secs_f64();
        telemetry::record_run_duration(&record.id, duration);

        match failure {
            None => {
                record.status = RunStatus::Succeeded;
                telemetry::record_run_success(&record.id);
                info!(
                    run_id = %record.id,
                    duration_seconds = duration,
                    stocks = ctx.stocks_analyzed,
                    "Pipeline run succeeded"
                );
            }
            Some(err) => {
                let step = err.failed_step().unwrap_or("unknown");
                record.status = RunStatus::Failed;
                telemetry::record_run_failure(&record.id, step);
                error!(
                    run_id = %record.id,
                    duration_seconds = duration,
                    step = step,
                    "Pipeline run failed"
                );
            }
        }

        Ok(record)
    }
}
