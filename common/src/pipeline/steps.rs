// The three standard pipeline steps

use crate::advisor::AdvisorClient;
use crate::analysis::StockAnalyzer;
use crate::errors::AdvisorError;
use crate::git::{GitPublisher, GitWorkspace, PublishOutcome};
use crate::market::{MarketData, MarketDataClient};
use crate::pipeline::{PipelineStep, RunContext, StepOutcome};
use crate::report::ReportWriter;
use crate::telemetry;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::config::Settings;

/// Step 1: produce a clean checkout of the data repository
pub struct CheckoutStep {
    workspace: GitWorkspace,
}

impl CheckoutStep {
    pub fn new(workspace: GitWorkspace) -> Self {
        Self { workspace }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(GitWorkspace::new(settings.repository.clone()))
    }
}

#[async_trait]
impl PipelineStep for CheckoutStep {
    fn name(&self) -> &'static str {
        "checkout"
    }

    async fn execute(&self, ctx: &mut RunContext) -> anyhow::Result<StepOutcome> {
        let path = self.workspace.ensure_clean_checkout().await?;
        ctx.set_workspace(path);
        Ok(StepOutcome::Completed)
    }
}

/// Step 2: run the signaling job and write its reports into the workspace
pub struct SignalStep {
    market: Arc<dyn MarketData>,
    advisor: Option<AdvisorClient>,
}

impl SignalStep {
    pub fn new(market: Arc<dyn MarketData>, advisor: Option<AdvisorClient>) -> Self {
        Self { market, advisor }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let market = Arc::new(MarketDataClient::new(&settings.market)?);
        let advisor = if settings.advisor.enabled {
            Some(AdvisorClient::new(settings.advisor.clone())?)
        } else {
            None
        };
        Ok(Self::new(market, advisor))
    }
}

#[async_trait]
impl PipelineStep for SignalStep {
    fn name(&self) -> &'static str {
        "signal"
    }

    async fn execute(&self, ctx: &mut RunContext) -> anyhow::Result<StepOutcome> {
        let workspace = ctx.workspace()?.to_path_buf();
        let settings = ctx.settings.clone();

        let analyzer = StockAnalyzer::new(
            self.market.clone(),
            settings.analysis.clone(),
            &settings.market,
        );
        let today = Utc::now().date_naive();
        let reports = analyzer.analyze_all(today).await?;

        telemetry::record_stocks_analyzed(reports.len() as u64);
        for report in &reports {
            telemetry::record_signal_emitted(report.final_signal);
        }
        ctx.stocks_analyzed = reports.len();

        let output_dir = workspace.join(&settings.report.output_dir);
        let writer = ReportWriter::new(&output_dir);
        let mut written = writer.write_all(&reports)?;

        if let Some(advisor) = &self.advisor {
            let api_key = ctx.api_key.as_ref().ok_or(AdvisorError::MissingApiKey)?;
            let recommendations = advisor.recommend(&reports, api_key).await?;

            let path = output_dir.join("recommendations.json");
            std::fs::write(&path, recommendations).map_err(|e| AdvisorError::WriteFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            info!(path = %path.display(), "Recommendations written");
            written.push(path);
        }

        ctx.report_paths = written;
        Ok(StepOutcome::Completed)
    }
}

/// Step 3: stage, commit, and push whatever the run produced
pub struct PublishStep {
    publisher: GitPublisher,
}

impl PublishStep {
    pub fn new(publisher: GitPublisher) -> Self {
        Self { publisher }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(GitPublisher::new(
            settings.repository.clone(),
            settings.git.clone(),
        ))
    }
}

#[async_trait]
impl PipelineStep for PublishStep {
    fn name(&self) -> &'static str {
        "publish"
    }

    async fn execute(&self, ctx: &mut RunContext) -> anyhow::Result<StepOutcome> {
        let workspace = ctx.workspace()?;
        match self
            .publisher
            .publish(workspace, ctx.push_token.as_ref())
            .await?
        {
            PublishOutcome::Pushed { commit } => {
                info!(commit = %commit, "Run output published");
                Ok(StepOutcome::Completed)
            }
            PublishOutcome::NothingToCommit => {
                Ok(StepOutcome::Skipped("no changes to commit".to_string()))
            }
        }
    }
}
