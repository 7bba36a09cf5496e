// Market data client for the exchange HTTP API
//
// Wraps the four endpoints the signaling job reads: index snapshot, listed
// securities, company disclosures, and per-security price history. The API
// sits behind an aggressive CDN and sheds load freely, so every call runs
// through the retry strategy.

use crate::config::MarketConfig;
use crate::errors::MarketError;
use crate::models::{
    HistoryPage, IndexEntry, MarketSnapshot, MarketStatus, NewsFeed, NewsItem, PriceBar, Security,
};
use crate::retry::{ExponentialBackoff, RetryStrategy};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Read access to exchange data, seam for tests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Index values plus the market-open flag
    async fn market_snapshot(&self) -> Result<MarketSnapshot, MarketError>;

    /// Listed securities with `activeStatus == "A"`
    async fn listed_securities(&self) -> Result<Vec<Security>, MarketError>;

    /// Company disclosures grouped by symbol
    async fn news_by_symbol(&self) -> Result<HashMap<String, Vec<NewsItem>>, MarketError>;

    /// Daily bars for one security over the given date range
    async fn price_history(
        &self,
        security_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, MarketError>;
}

/// HTTP implementation of [`MarketData`]
pub struct MarketDataClient {
    client: Client,
    base_url: String,
    retry: ExponentialBackoff,
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:135.0) Gecko/20100101 Firefox/135.0",
        ),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en"));
    headers
}

impl MarketDataClient {
    /// Create a new client from market configuration
    pub fn new(config: &MarketConfig) -> Result<Self, MarketError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(default_headers())
            .build()
            .map_err(|e| MarketError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: ExponentialBackoff::new(config.max_retries),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a JSON payload with bounded retries
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, MarketError> {
        let url = self.url(path);
        let mut attempt: u32 = 0;
        let mut last_error;

        loop {
            match self.get_json_once(&url, query).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(url = %url, attempt = attempt + 1, error = %e, "Fetch attempt failed");
                    last_error = e;
                }
            }

            match self.retry.next_delay(attempt) {
                Some(delay) => tokio::time::sleep(delay).await,
                None => {
                    return Err(MarketError::RetriesExhausted {
                        attempts: attempt + 1,
                        last_error: last_error.to_string(),
                    });
                }
            }
            attempt += 1;
        }
    }

    async fn get_json_once<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, MarketError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| MarketError::RequestFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(|e| MarketError::DecodeFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl MarketData for MarketDataClient {
    #[instrument(skip(self))]
    async fn market_snapshot(&self) -> Result<MarketSnapshot, MarketError> {
        let index: Vec<IndexEntry> = self.get_json("/nepse-index", &[]).await?;
        let status: MarketStatus = self.get_json("/nepse-data/market-open", &[]).await?;

        let snapshot = MarketSnapshot {
            market_open: status.is_open(),
            index,
        };
        info!(market_open = snapshot.market_open, "Fetched market snapshot");
        Ok(snapshot)
    }

    #[instrument(skip(self))]
    async fn listed_securities(&self) -> Result<Vec<Security>, MarketError> {
        let all: Vec<Security> = self
            .get_json("/security", &[("nonDelisted", "true".to_string())])
            .await?;

        let active: Vec<Security> = all.into_iter().filter(Security::is_active).collect();
        info!(count = active.len(), "Fetched listed securities");
        Ok(active)
    }

    #[instrument(skip(self))]
    async fn news_by_symbol(&self) -> Result<HashMap<String, Vec<NewsItem>>, MarketError> {
        let feed: NewsFeed = self.get_json("/news/companies/disclosure", &[]).await?;

        let mut by_symbol: HashMap<String, Vec<NewsItem>> = HashMap::new();
        for item in feed.company_news {
            if let Some(symbol) = item.symbol.clone() {
                by_symbol.entry(symbol).or_default().push(item);
            }
        }
        debug!(symbols = by_symbol.len(), "Grouped disclosures by symbol");
        Ok(by_symbol)
    }

    #[instrument(skip(self))]
    async fn price_history(
        &self,
        security_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, MarketError> {
        let path = format!("/market/history/security/{}", security_id);
        let query = [
            ("startDate", start.format("%Y-%m-%d").to_string()),
            ("endDate", end.format("%Y-%m-%d").to_string()),
            ("size", "500".to_string()),
        ];

        let page: HistoryPage = self.get_json(&path, &query).await?;
        Ok(page.content)
    }
}
