// Buy/sell pressure from daily bars
//
// Each bar's pressure is its traded volume scaled by the magnitude of the
// day's percentage move; positive moves accumulate on the buy side,
// negative moves on the sell side.

use crate::models::PriceBar;

/// Accumulated buy and sell pressure
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pressure {
    pub buy: f64,
    pub sell: f64,
}

impl Pressure {
    pub fn net(&self) -> f64 {
        self.buy - self.sell
    }
}

/// Compute pressure over bars ordered oldest-first
///
/// Bars following a zero close contribute nothing (a percentage change is
/// undefined there).
pub fn buy_sell_pressure(bars: &[PriceBar]) -> Pressure {
    let mut pressure = Pressure::default();

    for pair in bars.windows(2) {
        let prev = pair[0].close_price;
        let current = &pair[1];
        if prev == 0.0 {
            continue;
        }

        let pct_change = (current.close_price - prev) / prev * 100.0;
        let weight = current.total_traded_quantity * pct_change.abs();

        if pct_change > 0.0 {
            pressure.buy += weight;
        } else if pct_change < 0.0 {
            pressure.sell += weight;
        }
    }

    pressure
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64, volume: f64) -> PriceBar {
        PriceBar {
            business_date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            close_price: close,
            total_traded_quantity: volume,
        }
    }

    #[test]
    fn test_empty_and_single_bar_have_no_pressure() {
        assert_eq!(buy_sell_pressure(&[]), Pressure::default());
        assert_eq!(buy_sell_pressure(&[bar(1, 100.0, 50.0)]), Pressure::default());
    }

    #[test]
    fn test_rising_close_accumulates_buy_pressure() {
        let bars = [bar(1, 100.0, 0.0), bar(2, 110.0, 500.0)];
        let pressure = buy_sell_pressure(&bars);
        // +10% move on 500 volume
        assert!((pressure.buy - 5000.0).abs() < 1e-6);
        assert_eq!(pressure.sell, 0.0);
        assert!(pressure.net() > 0.0);
    }

    #[test]
    fn test_falling_close_accumulates_sell_pressure() {
        let bars = [bar(1, 100.0, 0.0), bar(2, 90.0, 300.0)];
        let pressure = buy_sell_pressure(&bars);
        assert_eq!(pressure.buy, 0.0);
        assert!((pressure.sell - 3000.0).abs() < 1e-6);
        assert!(pressure.net() < 0.0);
    }

    #[test]
    fn test_flat_close_contributes_nothing() {
        let bars = [bar(1, 100.0, 100.0), bar(2, 100.0, 100.0)];
        assert_eq!(buy_sell_pressure(&bars), Pressure::default());
    }

    #[test]
    fn test_zero_previous_close_is_skipped() {
        let bars = [bar(1, 0.0, 100.0), bar(2, 50.0, 100.0)];
        assert_eq!(buy_sell_pressure(&bars), Pressure::default());
    }
}
