// Decision matrix combining technical signal, pressure, and sentiment

use crate::models::{Signal, TechnicalSignal};

/// Combine the three analysis inputs into a final signal
///
/// Technical verdict is worth two points to its side, pressure sign and
/// sentiment (beyond the threshold) one point each. A side needs at least
/// three points and strictly more than the other to win; otherwise Hold.
pub fn decide(
    technical: TechnicalSignal,
    net_pressure: f64,
    sentiment: f64,
    sentiment_threshold: f64,
) -> Signal {
    let mut buy_points = 0u32;
    let mut sell_points = 0u32;

    match technical {
        TechnicalSignal::Buy => buy_points += 2,
        TechnicalSignal::Sell => sell_points += 2,
        TechnicalSignal::Neutral => {}
    }

    if net_pressure > 0.0 {
        buy_points += 1;
    } else if net_pressure < 0.0 {
        sell_points += 1;
    }

    if sentiment > sentiment_threshold {
        buy_points += 1;
    } else if sentiment < -sentiment_threshold {
        sell_points += 1;
    }

    if buy_points >= 3 && buy_points > sell_points {
        Signal::Buy
    } else if sell_points >= 3 && sell_points > buy_points {
        Signal::Sell
    } else {
        Signal::Hold
    }
}
