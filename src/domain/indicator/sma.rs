//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]).
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{defined, mean, rolling_window, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

pub fn calculate_sma(series: &PriceSeries, period: usize) -> IndicatorSeries {
    IndicatorSeries::from_simple(
        IndicatorType::Sma(period),
        &series.dates(),
        sma_values(&defined(&series.closes()), period),
    )
}

pub(crate) fn sma_values(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling_window(values, period, mean)
}
