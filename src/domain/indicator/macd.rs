//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! All three EMAs seed from their first input, so every line is defined
//! from the first bar.

use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{defined, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    series: &PriceSeries,
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let closes = defined(&series.closes());
    let ema_fast = ema_values(&closes, fast);
    let ema_slow = ema_values(&closes, slow);

    let macd_line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal_line = ema_values(&macd_line, signal_period);

    let values = series
        .bars()
        .iter()
        .zip(macd_line.iter().zip(&signal_line))
        .map(|(bar, (line, signal))| {
            let value = match (line, signal) {
                (Some(line), Some(signal)) => Some(IndicatorValue::Macd {
                    line: *line,
                    signal: *signal,
                    histogram: line - signal,
                }),
                _ => None,
            };
            IndicatorPoint {
                date: bar.date,
                value,
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Macd {
            fast,
            slow,
            signal: signal_period,
        },
        values,
    }
}

pub fn calculate_macd_default(series: &PriceSeries) -> IndicatorSeries {
    calculate_macd(series, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
