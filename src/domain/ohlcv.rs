//! Daily OHLCV bars and validated price series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::error::StockrankError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Returns a description of the first broken bar invariant, if any.
    fn defect(&self) -> Option<&'static str> {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            return Some("non-finite value");
        }
        if fields.iter().any(|&v| v < 0.0) {
            return Some("negative value");
        }
        if self.close <= 0.0 {
            return Some("close must be positive");
        }
        None
    }
}

/// Ordered bars for one symbol: strictly increasing dates, every bar valid.
///
/// Gaps between dates are allowed. An empty series can be built, but every
/// computation over it reports insufficient data.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, StockrankError> {
        let symbol = symbol.into();

        for bar in &bars {
            if let Some(reason) = bar.defect() {
                return Err(StockrankError::InvalidSeries {
                    symbol,
                    reason: format!("{} on {}", reason, bar.date),
                });
            }
        }

        if let Some(pair) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            let reason = if pair[1].date == pair[0].date {
                format!("duplicate date {}", pair[1].date)
            } else {
                format!("{} follows {}", pair[1].date, pair[0].date)
            };
            return Err(StockrankError::InvalidSeries { symbol, reason });
        }

        Ok(Self { symbol, bars })
    }

    /// Sorts by date before validating. Duplicate dates are still rejected.
    pub fn from_unsorted(
        symbol: impl Into<String>,
        mut bars: Vec<PriceBar>,
    ) -> Result<Self, StockrankError> {
        bars.sort_by_key(|b| b.date);
        Self::new(symbol, bars)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }
}
