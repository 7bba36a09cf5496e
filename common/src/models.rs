use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Exchange payloads
// ============================================================================

/// A listed security as returned by the exchange
///
/// `GET /security?nonDelisted=true` also returns suspended instruments; only
/// those with `activeStatus == "A"` are analyzed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    pub id: i64,
    pub symbol: String,
    #[serde(default)]
    pub security_name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub active_status: Option<String>,
}

impl Security {
    pub fn is_active(&self) -> bool {
        self.active_status.as_deref() == Some("A")
    }
}

/// One daily price bar from the security history endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBar {
    pub business_date: NaiveDate,
    pub close_price: f64,
    #[serde(default)]
    pub total_traded_quantity: f64,
}

/// Paged wrapper around the history endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPage {
    #[serde(default)]
    pub content: Vec<PriceBar>,
}

/// A company disclosure item
///
/// `publishedDate` stays a raw string; malformed dates are tolerated and the
/// item simply contributes no sentiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub news_headline: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
}

/// Disclosure feed wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsFeed {
    #[serde(default)]
    pub company_news: Vec<NewsItem>,
}

/// One entry of the NEPSE index listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    #[serde(default)]
    pub index: Option<String>,
    #[serde(default)]
    pub current_value: Option<f64>,
}

/// Market-open flag payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStatus {
    pub is_open: serde_json::Value,
}

impl MarketStatus {
    /// The endpoint has been observed returning both a boolean and the
    /// strings "OPEN"/"CLOSE" for `isOpen`.
    pub fn is_open(&self) -> bool {
        match &self.is_open {
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::String(s) => s.eq_ignore_ascii_case("open"),
            _ => false,
        }
    }
}

/// Combined market overview fetched at the start of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub index: Vec<IndexEntry>,
    pub market_open: bool,
}

// ============================================================================
// Analysis results
// ============================================================================

/// Final per-stock recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Buy => write!(f, "Buy"),
            Signal::Sell => write!(f, "Sell"),
            Signal::Hold => write!(f, "Hold"),
        }
    }
}

/// Majority verdict of the technical indicators alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TechnicalSignal {
    Buy,
    Sell,
    Neutral,
}

impl std::fmt::Display for TechnicalSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TechnicalSignal::Buy => write!(f, "Buy"),
            TechnicalSignal::Sell => write!(f, "Sell"),
            TechnicalSignal::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Latest indicator values for one stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub signal: TechnicalSignal,
    pub bollinger_min: f64,
    pub bollinger_max: f64,
    pub bollinger_current: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub rsi: f64,
    pub short_ma: f64,
    pub long_ma: f64,
}

impl IndicatorSnapshot {
    /// Snapshot used when there is not enough history to compute indicators
    pub fn neutral() -> Self {
        Self {
            signal: TechnicalSignal::Neutral,
            bollinger_min: 0.0,
            bollinger_max: 0.0,
            bollinger_current: 0.0,
            macd: 0.0,
            macd_signal: 0.0,
            rsi: 0.0,
            short_ma: 0.0,
            long_ma: 0.0,
        }
    }
}

/// Complete analysis result for one stock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReport {
    pub symbol: String,
    pub sector: Option<String>,
    pub final_signal: Signal,
    pub sentiment_score: f64,
    pub buy_pressure: f64,
    pub sell_pressure: f64,
    pub net_pressure: f64,
    pub technical: IndicatorSnapshot,
}

// ============================================================================
// Run bookkeeping
// ============================================================================

/// How a pipeline run was initiated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Scheduled,
    Manual,
}

/// Lifecycle of a single pipeline step within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

/// Per-step record inside a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl StepRecord {
    pub fn pending(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: StepStatus::Pending,
            started_at: None,
            completed_at: None,
            error: None,
        }
    }
}

/// Overall state of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
}

/// Record of one pipeline run, from trigger to completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub trigger: TriggerSource,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepRecord>,
}

impl RunRecord {
    pub fn new(trigger: TriggerSource, step_names: &[&str]) -> Self {
        Self {
            id: Uuid::new_v4(),
            trigger,
            status: RunStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            steps: step_names.iter().map(|n| StepRecord::pending(n)).collect(),
        }
    }
}
