//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is the sample standard deviation (divides by n-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are undefined.

use crate::domain::indicator::sma::sma_values;
use crate::domain::indicator::stddev::stddev_values;
use crate::domain::indicator::{defined, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULT_X100: u32 = 200;

pub fn calculate_bollinger(
    series: &PriceSeries,
    period: usize,
    stddev_mult_x100: u32,
) -> IndicatorSeries {
    let closes = defined(&series.closes());
    let middles = sma_values(&closes, period);
    let deviations = stddev_values(&closes, period);
    let mult = stddev_mult_x100 as f64 / 100.0;

    let values = series
        .bars()
        .iter()
        .zip(middles.iter().zip(&deviations))
        .map(|(bar, (middle, stddev))| {
            let value = match (middle, stddev) {
                (Some(middle), Some(stddev)) => {
                    let half_width = mult * stddev;
                    Some(IndicatorValue::Bollinger {
                        upper: middle + half_width,
                        middle: *middle,
                        lower: middle - half_width,
                    })
                }
                _ => None,
            };
            IndicatorPoint {
                date: bar.date,
                value,
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        values,
    }
}
