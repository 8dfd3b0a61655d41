//! Standard Deviation indicator.
//!
//! Sample standard deviation over n closing prices.
//! STDDEV(n)[i] = sqrt(sum((C[i-j] - SMA(n)[i])^2 for j in 0..n) / (n - 1))
//! Warmup: first (n-1) bars are undefined. Periods below 2 are undefined
//! throughout.

use crate::domain::indicator::{defined, rolling_window, sample_stddev, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

pub fn calculate_stddev(series: &PriceSeries, period: usize) -> IndicatorSeries {
    IndicatorSeries::from_simple(
        IndicatorType::Stddev(period),
        &series.dates(),
        stddev_values(&defined(&series.closes()), period),
    )
}

pub(crate) fn stddev_values(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period < 2 {
        return vec![None; values.len()];
    }
    rolling_window(values, period, sample_stddev)
}
