// Configuration management with layered configuration (file, env)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;
use std::str::FromStr;

use chrono_tz::Tz;

/// Environment variable carrying the advisor API credential
pub const API_KEY_ENV: &str = "OPEN_AI_API_KEY";

/// Environment variable carrying the elevated push credential
pub const PUSH_TOKEN_ENV: &str = "GIT_PUSH_TOKEN";

// Helper functions for Tz serialization
fn serialize_tz<S>(tz: &Tz, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&tz.to_string())
}

fn deserialize_tz<'de, D>(deserializer: D) -> Result<Tz, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Tz::from_str(&s).map_err(serde::de::Error::custom)
}

/// A credential value that never appears in Debug output or serialized config
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Read a secret from the process environment
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var).ok().filter(|v| !v.is_empty()).map(Self)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString(***)")
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

/// Main settings structure containing all configuration options
///
/// Missing sections fall back to their defaults so a partial
/// `config/default.toml` stays valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub repository: RepositoryConfig,
    pub schedule: ScheduleConfig,
    pub market: MarketConfig,
    pub analysis: AnalysisConfig,
    pub advisor: AdvisorConfig,
    pub report: ReportConfig,
    pub git: GitConfig,
    pub observability: ObservabilityConfig,
}

/// Data repository the pipeline checks out and publishes to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Clone/push URL without credentials
    pub url: String,
    pub branch: String,
    pub remote: String,
    /// Directory the clean checkout lives in
    pub workspace_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds-precision cron expression
    pub cron_expression: String,
    #[serde(serialize_with = "serialize_tz", deserialize_with = "deserialize_tz")]
    pub timezone: Tz,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Bounded attempts per fetch before the stock is skipped
    pub max_retries: u32,
    /// How many stocks are analyzed concurrently
    pub concurrency: usize,
    pub history_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub short_ma_window: usize,
    pub long_ma_window: usize,
    pub bollinger_window: usize,
    pub bollinger_std: f64,
    pub macd_short_window: usize,
    pub macd_long_window: usize,
    pub macd_signal_window: usize,
    pub rsi_window: usize,
    /// Bars required before indicators are trusted
    pub min_history_bars: usize,
    pub sentiment_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output directory relative to the workspace
    pub output_dir: String,
}

/// Service identity and fixed commit message for the publish step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    pub author_name: String,
    pub author_email: String,
    pub commit_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub metrics_port: u16,
    pub tracing_endpoint: Option<String>,
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default configuration
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // Add environment-specific configuration
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.repository.url.is_empty() {
            return Err("Repository URL cannot be empty".to_string());
        }
        if self.repository.branch.is_empty() {
            return Err("Repository branch cannot be empty".to_string());
        }

        if self.schedule.cron_expression.is_empty() {
            return Err("Schedule cron expression cannot be empty".to_string());
        }

        if self.market.base_url.is_empty() {
            return Err("Market base URL cannot be empty".to_string());
        }
        if self.market.max_retries == 0 {
            return Err("Market max_retries must be greater than 0".to_string());
        }
        if self.market.concurrency == 0 {
            return Err("Market concurrency must be greater than 0".to_string());
        }
        if self.market.history_days <= 0 {
            return Err("Market history_days must be greater than 0".to_string());
        }

        if self.analysis.short_ma_window == 0 || self.analysis.long_ma_window == 0 {
            return Err("Moving average windows must be greater than 0".to_string());
        }
        if self.analysis.short_ma_window >= self.analysis.long_ma_window {
            return Err("short_ma_window must be smaller than long_ma_window".to_string());
        }
        if self.analysis.rsi_window == 0 || self.analysis.bollinger_window == 0 {
            return Err("Indicator windows must be greater than 0".to_string());
        }

        if self.advisor.enabled && self.advisor.base_url.is_empty() {
            return Err("Advisor base URL required when advisor is enabled".to_string());
        }

        if self.report.output_dir.is_empty() {
            return Err("Report output_dir cannot be empty".to_string());
        }

        if self.git.author_name.is_empty() || self.git.author_email.is_empty() {
            return Err("Git service identity cannot be empty".to_string());
        }
        if self.git.commit_message.is_empty() {
            return Err("Git commit message cannot be empty".to_string());
        }

        Ok(())
    }

    /// Advisor credential from the environment, if present
    pub fn api_key(&self) -> Option<SecretString> {
        SecretString::from_env(API_KEY_ENV)
    }

    /// Elevated push credential from the environment, if present
    pub fn push_token(&self) -> Option<SecretString> {
        SecretString::from_env(PUSH_TOKEN_ENV)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            repository: RepositoryConfig {
                url: "https://github.com/example/nepse-data.git".to_string(),
                branch: "master".to_string(),
                remote: "origin".to_string(),
                workspace_dir: "workspace".to_string(),
            },
            schedule: ScheduleConfig {
                // 09:30 UTC daily
                cron_expression: "0 30 9 * * * *".to_string(),
                timezone: chrono_tz::UTC,
            },
            market: MarketConfig {
                base_url: "https://nepalstock.onrender.com".to_string(),
                timeout_seconds: 30,
                max_retries: 5,
                concurrency: 10,
                history_days: 365,
            },
            analysis: AnalysisConfig {
                short_ma_window: 5,
                long_ma_window: 20,
                bollinger_window: 20,
                bollinger_std: 2.0,
                macd_short_window: 12,
                macd_long_window: 26,
                macd_signal_window: 9,
                rsi_window: 14,
                min_history_bars: 20,
                sentiment_threshold: 0.05,
            },
            advisor: AdvisorConfig {
                enabled: false,
                base_url: "https://api.deepseek.com".to_string(),
                model: "deepseek-reasoner".to_string(),
                timeout_seconds: 120,
            },
            report: ReportConfig {
                output_dir: "data".to_string(),
            },
            git: GitConfig {
                author_name: "nepse-signals-bot".to_string(),
                author_email: "nepse-signals-bot@users.noreply.github.com".to_string(),
                commit_message: "Update analyzed data on sheet via GitHub Actions".to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                metrics_port: 9090,
                tracing_endpoint: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_catches_empty_repository_url() {
        let mut settings = Settings::default();
        settings.repository.url = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_inverted_ma_windows() {
        let mut settings = Settings::default();
        settings.analysis.short_ma_window = 50;
        settings.analysis.long_ma_window = 20;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_zero_retries() {
        let mut settings = Settings::default();
        settings.market.max_retries = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = SecretString::new("hunter2");
        assert!(!format!("{:?}", secret).contains("hunter2"));
        assert!(!format!("{}", secret).contains("hunter2"));
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn test_load_from_missing_dir_falls_back_to_defaults() {
        let settings = Settings::load_from_path("definitely/not/a/config/dir").unwrap();
        assert_eq!(settings.repository.branch, "master");
    }

    #[test]
    fn test_default_commit_message_is_fixed_literal() {
        let settings = Settings::default();
        assert_eq!(
            settings.git.commit_message,
            "Update analyzed data on sheet via GitHub Actions"
        );
    }
}
