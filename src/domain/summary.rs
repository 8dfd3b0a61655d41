//! Whole-window price history summary used by risk scoring.

use serde::Serialize;

use crate::domain::error::StockrankError;
use crate::domain::indicator::volatility::{return_values, TRADING_DAYS_PER_YEAR};
use crate::domain::indicator::{mean, sample_stddev};
use crate::domain::ohlcv::PriceSeries;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalSummary {
    pub days_count: usize,
    pub latest_price: f64,
    pub latest_volume: f64,
    /// Percent change from the first to the last close.
    pub price_change_pct: f64,
    pub avg_volume: f64,
    /// Annualized sample volatility of daily returns, as a fraction.
    /// Undefined with fewer than two returns.
    pub volatility: Option<f64>,
}

impl HistoricalSummary {
    pub fn from_series(series: &PriceSeries) -> Result<Self, StockrankError> {
        let (first, last) = match (series.first(), series.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(StockrankError::InsufficientData {
                    symbol: series.symbol().to_string(),
                    bars: 0,
                    minimum: 1,
                });
            }
        };

        let returns: Vec<f64> = return_values(&series.closes()).into_iter().flatten().collect();
        let volatility = if returns.len() >= 2 {
            Some(sample_stddev(&returns) * TRADING_DAYS_PER_YEAR.sqrt())
        } else {
            None
        };

        Ok(Self {
            days_count: series.len(),
            latest_price: last.close,
            latest_volume: last.volume,
            price_change_pct: (last.close - first.close) / first.close * 100.0,
            avg_volume: mean(&series.volumes()),
            volatility,
        })
    }
}
