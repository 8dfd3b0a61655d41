//! Daily returns and annualized rolling volatility.
//!
//! RETURNS[i] = C[i] / C[i-1] - 1, undefined at bar 0.
//! VOLATILITY(n)[i] = sample stddev of the trailing n returns * sqrt(252).
//! Warmup: first n bars are undefined (n returns need n+1 closes).

use crate::domain::indicator::stddev::stddev_values;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const DEFAULT_PERIOD: usize = 20;

pub fn calculate_returns(series: &PriceSeries) -> IndicatorSeries {
    IndicatorSeries::from_simple(IndicatorType::Returns, &series.dates(), return_values(&series.closes()))
}

pub fn calculate_volatility(series: &PriceSeries, period: usize) -> IndicatorSeries {
    let annualize = TRADING_DAYS_PER_YEAR.sqrt();
    let values = stddev_values(&return_values(&series.closes()), period)
        .into_iter()
        .map(|sd| sd.map(|sd| sd * annualize))
        .collect();

    IndicatorSeries::from_simple(IndicatorType::Volatility(period), &series.dates(), values)
}

pub(crate) fn return_values(closes: &[f64]) -> Vec<Option<f64>> {
    (0..closes.len())
        .map(|i| {
            if i == 0 || closes[i - 1] <= 0.0 {
                None
            } else {
                Some(closes[i] / closes[i - 1] - 1.0)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::PriceBar;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_series(prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn returns_first_bar_undefined() {
        let series = calculate_returns(&make_series(&[100.0, 110.0, 99.0]));
        assert!(!series.values[0].is_defined());
        assert_relative_eq!(series.values[1].simple().unwrap(), 0.1, epsilon = 1e-12);
        assert_relative_eq!(series.values[2].simple().unwrap(), -0.1, epsilon = 1e-12);
    }

    #[test]
    fn volatility_warmup() {
        let prices: Vec<f64> = (0..25).map(|i| 100.0 + (i % 3) as f64).collect();
        let series = calculate_volatility(&make_series(&prices), 20);

        for i in 0..20 {
            assert!(!series.values[i].is_defined(), "Bar {} should be undefined", i);
        }
        assert!(series.values[20].is_defined());
    }

    #[test]
    fn volatility_constant_prices_is_zero() {
        let series = calculate_volatility(&make_series(&[50.0; 22]), 20);
        assert_relative_eq!(series.values[21].simple().unwrap(), 0.0);
    }

    #[test]
    fn volatility_is_annualized_sample_stddev() {
        // Returns +10%, -10%: mean 0, sample variance 0.02.
        let series = calculate_volatility(&make_series(&[100.0, 110.0, 99.0]), 2);
        let expected = 0.02_f64.sqrt() * 252.0_f64.sqrt();
        assert_relative_eq!(series.values[2].simple().unwrap(), expected, epsilon = 1e-12);
    }
}
