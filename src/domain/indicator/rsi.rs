//! RSI (Relative Strength Index) indicator.
//!
//! Bar-over-bar close changes are split into gains and losses, each averaged
//! with a simple mean over the trailing n changes:
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 and avg_gain > 0: RSI = 100
//! If both averages are 0 (a flat window): RSI = `FLAT_RSI` (50, neutral)
//!
//! Warmup: first n bars are undefined (bar 0 has no change, and n changes are
//! needed for the first average).

use crate::domain::indicator::{mean, rolling_window, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_PERIOD: usize = 14;

/// Value reported when the window contains no price movement at all.
pub const FLAT_RSI: f64 = 50.0;

pub fn calculate_rsi(series: &PriceSeries, period: usize) -> IndicatorSeries {
    let closes = series.closes();

    let mut gains: Vec<Option<f64>> = Vec::with_capacity(closes.len());
    let mut losses: Vec<Option<f64>> = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        if i == 0 {
            gains.push(None);
            losses.push(None);
            continue;
        }
        let change = closes[i] - closes[i - 1];
        gains.push(Some(if change > 0.0 { change } else { 0.0 }));
        losses.push(Some(if change < 0.0 { -change } else { 0.0 }));
    }

    let avg_gains = rolling_window(&gains, period, mean);
    let avg_losses = rolling_window(&losses, period, mean);

    let values = avg_gains
        .iter()
        .zip(&avg_losses)
        .map(|(g, l)| Some(rsi_from_averages((*g)?, (*l)?)))
        .collect();

    IndicatorSeries::from_simple(IndicatorType::Rsi(period), &series.dates(), values)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { FLAT_RSI } else { 100.0 }
    } else {
        let rsi = 100.0 - (100.0 / (1.0 + avg_gain / avg_loss));
        rsi.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::PriceBar;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_bar(date: &str, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
        }
    }

    fn make_series(closes: &[f64]) -> PriceSeries {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| make_bar(&format!("2024-01-{:02}", i + 1), c))
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn rsi_empty_series() {
        let series = calculate_rsi(&make_series(&[]), 14);
        assert_eq!(series.values.len(), 0);
    }

    #[test]
    fn rsi_single_bar() {
        let series = calculate_rsi(&make_series(&[100.0]), 14);
        assert_eq!(series.values.len(), 1);
        assert!(!series.values[0].is_defined());
    }

    #[test]
    fn rsi_warmup_period() {
        let closes: Vec<f64> = (1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let series = calculate_rsi(&make_series(&closes), 14);

        assert_eq!(series.values.len(), 15);
        for i in 0..14 {
            assert!(!series.values[i].is_defined(), "Bar {} should be undefined", i);
        }
        assert!(series.values[14].is_defined(), "Bar 14 should be defined");
    }

    #[test]
    fn rsi_all_gains_no_losses() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&make_series(&closes), 14);
        assert_eq!(series.values[14].simple(), Some(100.0));
    }

    #[test]
    fn rsi_all_losses_no_gains() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&make_series(&closes), 14);
        assert_relative_eq!(series.values[14].simple().unwrap(), 0.0);
    }

    #[test]
    fn rsi_flat_window_is_neutral() {
        let series = calculate_rsi(&make_series(&[100.0; 20]), 14);
        for point in &series.values[14..] {
            assert_eq!(point.simple(), Some(FLAT_RSI));
        }
    }

    #[test]
    fn rsi_simple_average_fixture() {
        // Changes +2, -1, +1, +2 over a 4-bar window: gain 5/4, loss 1/4 -> RS 5.
        let series = calculate_rsi(&make_series(&[10.0, 12.0, 11.0, 12.0, 14.0]), 4);
        assert_relative_eq!(series.values[4].simple().unwrap(), 100.0 - 100.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn rsi_window_drops_old_changes() {
        // With a 2-change window the early losses fall out and RSI reaches 100.
        let series = calculate_rsi(&make_series(&[10.0, 9.0, 8.0, 9.0, 10.0]), 2);
        assert_relative_eq!(series.values[2].simple().unwrap(), 0.0);
        assert_relative_eq!(series.values[3].simple().unwrap(), 50.0);
        assert_eq!(series.values[4].simple(), Some(100.0));
    }

    #[test]
    fn rsi_in_range() {
        let closes: Vec<f64> = (1..=20).map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0).collect();
        let series = calculate_rsi(&make_series(&closes), 14);

        for rsi in series.simple_values().into_iter().flatten() {
            assert!((0.0..=100.0).contains(&rsi), "RSI {} out of range", rsi);
        }
    }

    #[test]
    fn rsi_zero_period() {
        let series = calculate_rsi(&make_series(&[100.0, 101.0]), 0);
        assert_eq!(series.values.len(), 2);
        assert!(series.values.iter().all(|p| !p.is_defined()));
    }

    #[test]
    fn rsi_indicator_type() {
        let series = calculate_rsi(&make_series(&[100.0]), 14);
        assert_eq!(series.indicator_type, IndicatorType::Rsi(14));
    }
}
