// Property-based tests for the analysis pipeline

use chrono::NaiveDate;
use common::analysis::decision::decide;
use common::analysis::indicators::{bollinger, ema_series, rsi, sma_latest};
use common::analysis::pressure::buy_sell_pressure;
use common::config::Settings;
use common::models::{PriceBar, Signal, TechnicalSignal};
use common::report::sort_for_publication;
use proptest::prelude::*;

fn close_series() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..10_000.0, 2..200)
}

fn bars_from(closes: Vec<f64>, volumes: Vec<f64>) -> Vec<PriceBar> {
    closes
        .into_iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (close, volume))| PriceBar {
            business_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
                + chrono::Duration::days(i as i64),
            close_price: close,
            total_traded_quantity: volume,
        })
        .collect()
}

proptest! {
    /// RSI always lands in [0, 100], whatever the price path
    #[test]
    fn property_rsi_is_bounded(closes in close_series(), window in 2usize..50) {
        let value = rsi(&closes, window);
        prop_assert!((0.0..=100.0).contains(&value), "rsi {} out of bounds", value);
    }

    /// Bollinger bands always bracket their middle line
    #[test]
    fn property_bollinger_bands_ordered(
        closes in close_series(),
        window in 2usize..50,
        num_std in 0.0f64..4.0,
    ) {
        let (lower, middle, upper) = bollinger(&closes, window, num_std);
        prop_assert!(lower <= middle + 1e-9);
        prop_assert!(middle <= upper + 1e-9);
    }

    /// A trailing mean can never leave the range of its inputs
    #[test]
    fn property_sma_within_input_range(closes in close_series(), window in 1usize..50) {
        let value = sma_latest(&closes, window);
        let min = closes.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = closes.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(value >= min - 1e-9 && value <= max + 1e-9);
    }

    /// EMA output has one entry per input and stays within the input range
    #[test]
    fn property_ema_preserves_length_and_range(closes in close_series(), span in 1usize..50) {
        let ema = ema_series(&closes, span);
        prop_assert_eq!(ema.len(), closes.len());
        let min = closes.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = closes.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        for value in ema {
            prop_assert!(value >= min - 1e-9 && value <= max + 1e-9);
        }
    }

    /// Pressure sides are non-negative and swap when the price path reverses
    #[test]
    fn property_pressure_antisymmetric(
        closes in prop::collection::vec(1.0f64..10_000.0, 2..100),
        volume in 1.0f64..1_000.0,
    ) {
        let n = closes.len();
        let forward = buy_sell_pressure(&bars_from(closes.clone(), vec![volume; n]));
        prop_assert!(forward.buy >= 0.0 && forward.sell >= 0.0);

        let reversed: Vec<f64> = closes.iter().rev().cloned().collect();
        let backward = buy_sell_pressure(&bars_from(reversed, vec![volume; n]));
        // Reversing the walk turns each up-move into the mirror down-move of
        // a different relative size, so only the signs are comparable
        prop_assert_eq!(forward.buy > 0.0, backward.sell > 0.0);
        prop_assert_eq!(forward.sell > 0.0, backward.buy > 0.0);
    }

    /// A Buy verdict requires bullish technicals; Sell requires bearish ones
    #[test]
    fn property_decision_requires_technical_backing(
        net_pressure in -1_000_000.0f64..1_000_000.0,
        sentiment in -1.0f64..1.0,
    ) {
        let threshold = Settings::default().analysis.sentiment_threshold;
        prop_assert_ne!(
            decide(TechnicalSignal::Neutral, net_pressure, sentiment, threshold),
            Signal::Buy
        );
        prop_assert_ne!(
            decide(TechnicalSignal::Sell, net_pressure, sentiment, threshold),
            Signal::Buy
        );
        prop_assert_ne!(
            decide(TechnicalSignal::Buy, net_pressure, sentiment, threshold),
            Signal::Sell
        );
    }

    /// The decision matrix is symmetric under mirroring all inputs
    #[test]
    fn property_decision_is_symmetric(
        technical_buy in any::<bool>(),
        net_pressure in -1_000_000.0f64..1_000_000.0,
        sentiment in -1.0f64..1.0,
    ) {
        let threshold = Settings::default().analysis.sentiment_threshold;
        let technical = if technical_buy {
            TechnicalSignal::Buy
        } else {
            TechnicalSignal::Sell
        };
        let mirrored_technical = if technical_buy {
            TechnicalSignal::Sell
        } else {
            TechnicalSignal::Buy
        };

        let signal = decide(technical, net_pressure, sentiment, threshold);
        let mirrored = decide(mirrored_technical, -net_pressure, -sentiment, threshold);

        let expected = match signal {
            Signal::Buy => Signal::Sell,
            Signal::Sell => Signal::Buy,
            Signal::Hold => Signal::Hold,
        };
        prop_assert_eq!(mirrored, expected);
    }
}

/// Publication order keeps every report and groups them Buy, Sell, Hold
#[test]
fn property_publication_order_partitions_signals() {
    use common::models::{IndicatorSnapshot, StockReport};

    let signals = [Signal::Hold, Signal::Buy, Signal::Sell];
    let reports: Vec<StockReport> = (0..30)
        .map(|i| StockReport {
            symbol: format!("S{i:02}"),
            sector: None,
            final_signal: signals[i % 3],
            sentiment_score: (i as f64) / 30.0 - 0.5,
            buy_pressure: 0.0,
            sell_pressure: 0.0,
            net_pressure: (i as f64) * 10.0 - 150.0,
            technical: IndicatorSnapshot::neutral(),
        })
        .collect();

    let sorted = sort_for_publication(&reports);
    assert_eq!(sorted.len(), reports.len());

    let ranks: Vec<u8> = sorted
        .iter()
        .map(|r| match r.final_signal {
            Signal::Buy => 0,
            Signal::Sell => 1,
            Signal::Hold => 2,
        })
        .collect();
    let mut expected = ranks.clone();
    expected.sort_unstable();
    assert_eq!(ranks, expected, "signals must appear grouped Buy, Sell, Hold");

    // Same multiset of symbols in and out
    let mut before: Vec<&str> = reports.iter().map(|r| r.symbol.as_str()).collect();
    let mut after: Vec<&str> = sorted.iter().map(|r| r.symbol.as_str()).collect();
    before.sort_unstable();
    after.sort_unstable();
    assert_eq!(before, after);
}
