// Error handling framework

use thiserror::Error;

/// Schedule-related errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCronExpression { expression: String, reason: String },

    #[error("No next execution time available for expression '{0}'")]
    NoNextExecution(String),
}

/// Market data errors
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("Request to {url} returned status {status}")]
    BadStatus { url: String, status: u16 },

    #[error("Failed to decode response from {url}: {reason}")]
    DecodeFailed { url: String, reason: String },

    #[error("Retries exhausted after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

/// Analysis errors
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Market data error: {0}")]
    Market(#[from] MarketError),

    #[error("No listed securities returned by the exchange")]
    NoListedSecurities,
}

/// Report generation errors
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to create report directory {path}: {reason}")]
    CreateDirFailed { path: String, reason: String },

    #[error("Failed to write CSV report {path}: {reason}")]
    CsvWriteFailed { path: String, reason: String },

    #[error("Failed to write Excel report {path}: {reason}")]
    ExcelWriteFailed { path: String, reason: String },
}

/// Advisor (chat-completions) errors
#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Advisor API key is not set")]
    MissingApiKey,

    #[error("Advisor request failed: {0}")]
    RequestFailed(String),

    #[error("Advisor returned status {0}")]
    BadStatus(u16),

    #[error("Advisor response missing completion content")]
    EmptyCompletion,

    #[error("Failed to write recommendations to {path}: {reason}")]
    WriteFailed { path: String, reason: String },
}

/// Git workspace and publishing errors
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to spawn git: {0}")]
    SpawnFailed(String),

    #[error("git {subcommand} exited with status {status}: {stderr}")]
    CommandFailed {
        subcommand: String,
        status: i32,
        stderr: String,
    },

    #[error("Workspace path {0} is not a directory")]
    InvalidWorkspace(String),

    #[error("Push credential is not set")]
    MissingPushToken,

    #[error("Remote URL {0} cannot carry credentials")]
    UnsupportedRemoteUrl(String),
}

/// Pipeline execution errors
///
/// A step failure aborts the remaining pipeline; the failing step's name is
/// preserved so the run record can point at it.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Step '{step}' failed: {error:#}")]
    StepFailed {
        step: &'static str,
        error: anyhow::Error,
    },

    #[error("A run is already in flight, trigger skipped")]
    AlreadyRunning,
}

impl PipelineError {
    pub fn step(step: &'static str, error: impl Into<anyhow::Error>) -> Self {
        Self::StepFailed {
            step,
            error: error.into(),
        }
    }

    /// Name of the failing step, if any
    pub fn failed_step(&self) -> Option<&'static str> {
        match self {
            Self::StepFailed { step, .. } => Some(step),
            Self::AlreadyRunning => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_error_display() {
        let err = ScheduleError::InvalidCronExpression {
            expression: "* * * *".to_string(),
            reason: "invalid format".to_string(),
        };
        assert!(err.to_string().contains("Invalid cron expression"));
    }

    #[test]
    fn test_market_error_bad_status() {
        let err = MarketError::BadStatus {
            url: "https://example.test/security".to_string(),
            status: 503,
        };
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_pipeline_error_preserves_step_name() {
        let err = PipelineError::step("checkout", anyhow::anyhow!("boom"));
        assert_eq!(err.failed_step(), Some("checkout"));
        assert!(err.to_string().contains("checkout"));
    }

    #[test]
    fn test_already_running_has_no_step() {
        assert_eq!(PipelineError::AlreadyRunning.failed_step(), None);
    }
}
