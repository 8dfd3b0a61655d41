//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1). The first defined input seeds the recursion:
//! EMA[0] = C[0], then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! There is no warmup; the EMA is defined from the first bar. The same
//! convention drives the MACD fast, slow and signal lines.

use crate::domain::indicator::{defined, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

pub fn calculate_ema(series: &PriceSeries, period: usize) -> IndicatorSeries {
    IndicatorSeries::from_simple(
        IndicatorType::Ema(period),
        &series.dates(),
        ema_values(&defined(&series.closes()), period),
    )
}

/// Undefined inputs produce undefined outputs and leave the running EMA
/// untouched; leading undefined inputs delay the seed.
pub(crate) fn ema_values(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut ema: Option<f64> = None;

    values
        .iter()
        .map(|v| {
            let x = (*v)?;
            let next = match ema {
                None => x,
                Some(prev) => x * k + prev * (1.0 - k),
            };
            ema = Some(next);
            Some(next)
        })
        .collect()
}
