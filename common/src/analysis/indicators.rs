// Technical indicators over daily close prices
//
// All functions take the close series oldest-first. Rolling statistics use
// the same conventions as the usual dataframe implementations: means fall
// back to the available prefix (min_periods = 1), standard deviation is the
// sample deviation, EMAs are the adjust=false recurrence.

use crate::config::AnalysisConfig;
use crate::models::{IndicatorSnapshot, TechnicalSignal};

/// Mean of the trailing `window` values (or the whole prefix if shorter)
pub fn sma_latest(values: &[f64], window: usize) -> f64 {
    if values.is_empty() || window == 0 {
        return 0.0;
    }
    let start = values.len().saturating_sub(window);
    let tail = &values[start..];
    tail.iter().sum::<f64>() / tail.len() as f64
}

/// Sample standard deviation of the trailing `window` values
fn std_latest(values: &[f64], window: usize) -> f64 {
    let start = values.len().saturating_sub(window);
    let tail = &values[start..];
    if tail.len() < 2 {
        return 0.0;
    }
    let mean = tail.iter().sum::<f64>() / tail.len() as f64;
    let var = tail.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (tail.len() - 1) as f64;
    var.sqrt()
}

/// Exponential moving average series (adjust = false, alpha = 2/(span+1))
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev = values[0];
    out.push(prev);
    for &v in &values[1..] {
        prev = alpha * v + (1.0 - alpha) * prev;
        out.push(prev);
    }
    out
}

/// Bollinger bands of the trailing window: (lower, middle, upper)
pub fn bollinger(values: &[f64], window: usize, num_std: f64) -> (f64, f64, f64) {
    let middle = sma_latest(values, window);
    let std_dev = std_latest(values, window);
    (
        middle - num_std * std_dev,
        middle,
        middle + num_std * std_dev,
    )
}

/// Latest MACD line and signal line
pub fn macd(values: &[f64], short: usize, long: usize, signal: usize) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let ema_short = ema_series(values, short);
    let ema_long = ema_series(values, long);
    let macd_series: Vec<f64> = ema_short
        .iter()
        .zip(ema_long.iter())
        .map(|(s, l)| s - l)
        .collect();
    let signal_series = ema_series(&macd_series, signal);
    (
        *macd_series.last().unwrap_or(&0.0),
        *signal_series.last().unwrap_or(&0.0),
    )
}

/// Latest RSI over the trailing window of deltas
///
/// Flat windows (no gains, no losses) read as a neutral 50; all-gain windows
/// saturate at 100.
pub fn rsi(values: &[f64], window: usize) -> f64 {
    if values.len() < 2 {
        return 50.0;
    }
    let deltas: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let start = deltas.len().saturating_sub(window);
    let tail = &deltas[start..];

    let gain: f64 = tail.iter().filter(|d| **d > 0.0).sum::<f64>() / tail.len() as f64;
    let loss: f64 = -tail.iter().filter(|d| **d < 0.0).sum::<f64>() / tail.len() as f64;

    if loss == 0.0 && gain == 0.0 {
        return 50.0;
    }
    if loss == 0.0 {
        return 100.0;
    }

    let rs = gain / loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Compute the full indicator snapshot and the majority technical signal
pub fn evaluate(closes: &[f64], config: &AnalysisConfig) -> IndicatorSnapshot {
    if closes.len() < config.min_history_bars {
        return IndicatorSnapshot::neutral();
    }

    let current = *closes.last().unwrap_or(&0.0);
    let short_ma = sma_latest(closes, config.short_ma_window);
    let long_ma = sma_latest(closes, config.long_ma_window);
    let (lower, _middle, upper) =
        bollinger(closes, config.bollinger_window, config.bollinger_std);
    let (macd_line, signal_line) = macd(
        closes,
        config.macd_short_window,
        config.macd_long_window,
        config.macd_signal_window,
    );
    let rsi_value = rsi(closes, config.rsi_window);

    let mut buy_votes = 0u32;
    let mut sell_votes = 0u32;

    // Moving averages
    if short_ma > long_ma {
        buy_votes += 1;
    } else {
        sell_votes += 1;
    }

    // Bollinger bands: only vote outside the band
    if current < lower {
        buy_votes += 1;
    } else if current > upper {
        sell_votes += 1;
    }

    // MACD
    if macd_line > signal_line {
        buy_votes += 1;
    } else {
        sell_votes += 1;
    }

    // RSI: only vote at the extremes
    if rsi_value < 30.0 {
        buy_votes += 1;
    } else if rsi_value > 70.0 {
        sell_votes += 1;
    }

    let signal = match buy_votes.cmp(&sell_votes) {
        std::cmp::Ordering::Greater => TechnicalSignal::Buy,
        std::cmp::Ordering::Less => TechnicalSignal::Sell,
        std::cmp::Ordering::Equal => TechnicalSignal::Neutral,
    };

    IndicatorSnapshot {
        signal,
        bollinger_min: lower,
        bollinger_max: upper,
        bollinger_current: current,
        macd: macd_line,
        macd_signal: signal_line,
        rsi: rsi_value,
        short_ma,
        long_ma,
    }
}
