//! Volume moving average and relative volume.
//!
//! VOLUME_SMA(n)[i] = mean(V[i-n+1..=i])
//! VOLUME_RATIO(n)[i] = V[i] / VOLUME_SMA(n)[i]
//! The ratio is undefined while the average is undefined or zero.

use crate::domain::indicator::sma::sma_values;
use crate::domain::indicator::{defined, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::PriceSeries;

pub const DEFAULT_PERIOD: usize = 20;

pub fn calculate_volume_sma(series: &PriceSeries, period: usize) -> IndicatorSeries {
    IndicatorSeries::from_simple(
        IndicatorType::VolumeSma(period),
        &series.dates(),
        sma_values(&defined(&series.volumes()), period),
    )
}

pub fn calculate_volume_ratio(series: &PriceSeries, period: usize) -> IndicatorSeries {
    let volumes = series.volumes();
    let averages = sma_values(&defined(&volumes), period);

    let values = volumes
        .iter()
        .zip(averages)
        .map(|(volume, average)| match average {
            Some(avg) if avg > 0.0 => Some(volume / avg),
            _ => None,
        })
        .collect();

    IndicatorSeries::from_simple(IndicatorType::VolumeRatio(period), &series.dates(), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::PriceBar;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_series(volumes: &[f64]) -> PriceSeries {
        let bars = volumes
            .iter()
            .enumerate()
            .map(|(i, &volume)| PriceBar {
                date: NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(),
                open: 10.0,
                high: 10.0,
                low: 10.0,
                close: 10.0,
                volume,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn volume_sma_values() {
        let series = calculate_volume_sma(&make_series(&[100.0, 200.0, 300.0]), 2);
        assert!(!series.values[0].is_defined());
        assert_relative_eq!(series.values[1].simple().unwrap(), 150.0);
        assert_relative_eq!(series.values[2].simple().unwrap(), 250.0);
    }

    #[test]
    fn volume_ratio_values() {
        let series = calculate_volume_ratio(&make_series(&[100.0, 100.0, 400.0]), 2);
        assert!(!series.values[0].is_defined());
        assert_relative_eq!(series.values[1].simple().unwrap(), 1.0);
        assert_relative_eq!(series.values[2].simple().unwrap(), 400.0 / 250.0);
    }

    #[test]
    fn volume_ratio_zero_average_is_undefined() {
        let series = calculate_volume_ratio(&make_series(&[0.0, 0.0, 0.0]), 2);
        assert!(series.values.iter().all(|p| !p.is_defined()));
    }

    #[test]
    fn volume_ratio_zero_volume_with_positive_average() {
        let series = calculate_volume_ratio(&make_series(&[100.0, 0.0]), 2);
        assert_relative_eq!(series.values[1].simple().unwrap(), 0.0);
    }
}
