//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values
//!
//! Every indicator looks back only. A point whose window is not yet full
//! carries `None` rather than a placeholder number.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod volatility;
pub mod volume;

pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::{calculate_macd, calculate_macd_default};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stddev::calculate_stddev;
pub use volatility::{calculate_returns, calculate_volatility};
pub use volume::{calculate_volume_ratio, calculate_volume_sma};

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Option<IndicatorValue>,
}

impl IndicatorPoint {
    pub fn is_defined(&self) -> bool {
        self.value.is_some()
    }

    /// The scalar value for single-output indicators.
    pub fn simple(&self) -> Option<f64> {
        match self.value {
            Some(IndicatorValue::Simple(v)) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Stddev(usize),
    VolumeSma(usize),
    VolumeRatio(usize),
    Returns,
    Volatility(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub(crate) fn from_simple(
        indicator_type: IndicatorType,
        dates: &[NaiveDate],
        values: Vec<Option<f64>>,
    ) -> Self {
        let values = dates
            .iter()
            .zip(values)
            .map(|(&date, v)| IndicatorPoint {
                date,
                value: v.map(IndicatorValue::Simple),
            })
            .collect();
        Self {
            indicator_type,
            values,
        }
    }

    /// Scalar values in bar order, `None` where undefined.
    pub fn simple_values(&self) -> Vec<Option<f64>> {
        self.values.iter().map(IndicatorPoint::simple).collect()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::VolumeSma(period) => write!(f, "VOLUME_SMA({})", period),
            IndicatorType::VolumeRatio(period) => write!(f, "VOLUME_RATIO({})", period),
            IndicatorType::Returns => write!(f, "RETURNS"),
            IndicatorType::Volatility(period) => write!(f, "VOLATILITY({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

/// Applies `reduce` to every full trailing window of `period` values.
///
/// A window containing an undefined input is itself undefined.
pub(crate) fn rolling_window<F>(values: &[Option<f64>], period: usize, reduce: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    if period == 0 {
        return vec![None; values.len()];
    }

    let mut window: Vec<f64> = Vec::with_capacity(period);
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            window.clear();
            for v in &values[i + 1 - period..=i] {
                window.push((*v)?);
            }
            Some(reduce(&window))
        })
        .collect()
}

pub(crate) fn mean(window: &[f64]) -> f64 {
    window.iter().sum::<f64>() / window.len() as f64
}

/// Sample standard deviation (divides by n - 1). Callers guarantee n >= 2.
pub(crate) fn sample_stddev(window: &[f64]) -> f64 {
    let m = mean(window);
    let ss: f64 = window.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (window.len() - 1) as f64).sqrt()
}

pub(crate) fn defined(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn indicator_type_display_sma() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
    }

    #[test]
    fn indicator_type_display_macd() {
        let macd = IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.to_string(), "MACD(12,26,9)");
    }

    #[test]
    fn indicator_type_display_bollinger() {
        let boll = IndicatorType::Bollinger {
            period: 20,
            stddev_mult_x100: 200,
        };
        assert_eq!(boll.to_string(), "BOLLINGER(20,2)");
    }

    #[test]
    fn indicator_type_display_volume() {
        assert_eq!(IndicatorType::VolumeRatio(20).to_string(), "VOLUME_RATIO(20)");
        assert_eq!(IndicatorType::Volatility(20).to_string(), "VOLATILITY(20)");
    }

    #[test]
    fn rolling_window_warmup_and_values() {
        let out = rolling_window(&defined(&[1.0, 2.0, 3.0, 4.0]), 3, mean);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_relative_eq!(out[2].unwrap(), 2.0);
        assert_relative_eq!(out[3].unwrap(), 3.0);
    }

    #[test]
    fn rolling_window_propagates_undefined_inputs() {
        let out = rolling_window(&[None, Some(1.0), Some(2.0), Some(3.0)], 2, mean);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_relative_eq!(out[2].unwrap(), 1.5);
    }

    #[test]
    fn rolling_window_zero_period() {
        let out = rolling_window(&defined(&[1.0, 2.0]), 0, mean);
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn sample_stddev_known_values() {
        // Sample variance of 2,4,4,4,5,5,7,9 is 32/7.
        let sd = sample_stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_relative_eq!(sd, (32.0_f64 / 7.0).sqrt(), epsilon = 1e-12);
    }
}
