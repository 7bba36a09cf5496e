// Per-stock analysis driver

use crate::analysis::{decision, indicators, pressure, sentiment};
use crate::config::{AnalysisConfig, MarketConfig};
use crate::errors::AnalysisError;
use crate::market::MarketData;
use crate::models::{NewsItem, PriceBar, Security, StockReport};
use chrono::{Duration, NaiveDate};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Runs the full analysis across all listed securities
pub struct StockAnalyzer {
    market: Arc<dyn MarketData>,
    analysis: AnalysisConfig,
    history_days: i64,
    concurrency: usize,
}

impl StockAnalyzer {
    pub fn new(
        market: Arc<dyn MarketData>,
        analysis: AnalysisConfig,
        market_config: &MarketConfig,
    ) -> Self {
        Self {
            market,
            analysis,
            history_days: market_config.history_days,
            concurrency: market_config.concurrency.max(1),
        }
    }

    /// Analyze every active security and collect the per-stock reports
    ///
    /// Stocks whose history cannot be fetched are skipped; an empty security
    /// listing is treated as an exchange fault and fails the job.
    #[instrument(skip(self))]
    pub async fn analyze_all(&self, today: NaiveDate) -> Result<Vec<StockReport>, AnalysisError> {
        // The snapshot is informational; a miss does not fail the run
        match self.market.market_snapshot().await {
            Ok(snapshot) => {
                info!(market_open = snapshot.market_open, "Fetched market overview")
            }
            Err(e) => warn!(error = %e, "Failed to fetch market overview"),
        }

        let securities = self.market.listed_securities().await?;
        if securities.is_empty() {
            return Err(AnalysisError::NoListedSecurities);
        }

        let news = match self.market.news_by_symbol().await {
            Ok(news) => news,
            Err(e) => {
                warn!(error = %e, "Failed to fetch disclosures, continuing without sentiment");
                Default::default()
            }
        };

        let start = today - Duration::days(self.history_days);
        let total = securities.len();
        info!(stocks = total, "Analyzing listed securities");

        let reports: Vec<StockReport> = stream::iter(securities)
            .map(|security| {
                let news_items = news.get(&security.symbol).cloned().unwrap_or_default();
                async move { self.analyze_one(security, news_items, start, today).await }
            })
            .buffer_unordered(self.concurrency)
            .filter_map(|report| async move { report })
            .collect()
            .await;

        info!(analyzed = reports.len(), skipped = total - reports.len(), "Analysis complete");
        Ok(reports)
    }

    /// Analyze one security; None when its history is unavailable
    async fn analyze_one(
        &self,
        security: Security,
        news_items: Vec<NewsItem>,
        start: NaiveDate,
        today: NaiveDate,
    ) -> Option<StockReport> {
        let bars = match self
            .market
            .price_history(security.id, start, today)
            .await
        {
            Ok(bars) => bars,
            Err(e) => {
                warn!(symbol = %security.symbol, error = %e, "Skipping stock, history fetch failed");
                return None;
            }
        };

        if bars.is_empty() {
            debug!(symbol = %security.symbol, "Skipping stock, no history");
            return None;
        }

        let bars = normalize_bars(bars);
        let closes: Vec<f64> = bars.iter().map(|b| b.close_price).collect();

        let pressure = pressure::buy_sell_pressure(&bars);
        let technical = indicators::evaluate(&closes, &self.analysis);
        let sentiment = sentiment::news_sentiment(&news_items, today);
        let final_signal = decision::decide(
            technical.signal,
            pressure.net(),
            sentiment,
            self.analysis.sentiment_threshold,
        );

        debug!(
            symbol = %security.symbol,
            signal = %final_signal,
            technical = %technical.signal,
            sentiment = sentiment,
            net_pressure = pressure.net(),
            "Stock analyzed"
        );

        Some(StockReport {
            symbol: security.symbol,
            sector: security.sector,
            final_signal,
            sentiment_score: sentiment,
            buy_pressure: pressure.buy,
            sell_pressure: pressure.sell,
            net_pressure: pressure.net(),
            technical,
        })
    }
}

/// Sort bars by date and keep the last entry per date
fn normalize_bars(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    bars.sort_by_key(|b| b.business_date);
    bars.reverse();
    bars.dedup_by_key(|b| b.business_date);
    bars.reverse();
    bars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::errors::MarketError;
    use crate::market::MockMarketData;
    use crate::models::{MarketSnapshot, Signal};
    use std::collections::HashMap;

    fn security(id: i64, symbol: &str) -> Security {
        Security {
            id,
            symbol: symbol.to_string(),
            security_name: None,
            sector: Some("Commercial Banks".to_string()),
            active_status: Some("A".to_string()),
        }
    }

    fn bars(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                business_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
                    + Duration::days(i as i64),
                close_price: close,
                total_traded_quantity: 100.0,
            })
            .collect()
    }

    fn analyzer(mock: MockMarketData) -> StockAnalyzer {
        let settings = Settings::default();
        StockAnalyzer::new(Arc::new(mock), settings.analysis, &settings.market)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn expect_quiet_market(mock: &mut MockMarketData) {
        mock.expect_market_snapshot().returning(|| {
            Ok(MarketSnapshot {
                index: vec![],
                market_open: false,
            })
        });
        mock.expect_news_by_symbol()
            .returning(|| Ok(HashMap::new()));
    }

    #[tokio::test]
    async fn test_empty_listing_is_an_error() {
        let mut mock = MockMarketData::new();
        expect_quiet_market(&mut mock);
        mock.expect_listed_securities().returning(|| Ok(vec![]));

        let result = analyzer(mock).analyze_all(today()).await;
        assert!(matches!(result, Err(AnalysisError::NoListedSecurities)));
    }

    #[tokio::test]
    async fn test_history_failure_skips_stock_but_not_run() {
        let mut mock = MockMarketData::new();
        expect_quiet_market(&mut mock);
        mock.expect_listed_securities()
            .returning(|| Ok(vec![security(1, "NABIL"), security(2, "FLAKY")]));
        mock.expect_price_history()
            .returning(|id, _, _| {
                if id == 2 {
                    Err(MarketError::RetriesExhausted {
                        attempts: 5,
                        last_error: "503".into(),
                    })
                } else {
                    Ok(bars(&(1..=60).map(|v| 100.0 + v as f64).collect::<Vec<_>>()))
                }
            });

        let reports = analyzer(mock).analyze_all(today()).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].symbol, "NABIL");
        assert_eq!(reports[0].sector.as_deref(), Some("Commercial Banks"));
    }

    #[tokio::test]
    async fn test_uptrend_with_pressure_yields_buy() {
        let mut mock = MockMarketData::new();
        expect_quiet_market(&mut mock);
        mock.expect_listed_securities()
            .returning(|| Ok(vec![security(1, "NABIL")]));
        mock.expect_price_history().returning(|_, _, _| {
            Ok(bars(&(1..=60).map(|v| 100.0 + v as f64).collect::<Vec<_>>()))
        });

        let reports = analyzer(mock).analyze_all(today()).await.unwrap();
        assert_eq!(reports.len(), 1);
        // Technical Buy (+2) and positive pressure (+1) clear the bar
        assert_eq!(reports[0].final_signal, Signal::Buy);
        assert!(reports[0].net_pressure > 0.0);
    }

    #[tokio::test]
    async fn test_snapshot_failure_does_not_fail_run() {
        let mut mock = MockMarketData::new();
        mock.expect_market_snapshot().returning(|| {
            Err(MarketError::BadStatus {
                url: "x".into(),
                status: 500,
            })
        });
        mock.expect_news_by_symbol()
            .returning(|| Ok(HashMap::new()));
        mock.expect_listed_securities()
            .returning(|| Ok(vec![security(1, "NABIL")]));
        mock.expect_price_history()
            .returning(|_, _, _| Ok(bars(&[100.0; 30])));

        let reports = analyzer(mock).analyze_all(today()).await.unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].final_signal, Signal::Hold);
    }

    #[test]
    fn test_normalize_bars_keeps_last_per_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut input = bars(&[100.0, 101.0]);
        input.push(PriceBar {
            business_date: date,
            close_price: 999.0,
            total_traded_quantity: 1.0,
        });

        let normalized = normalize_bars(input);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].close_price, 999.0);
    }
}
