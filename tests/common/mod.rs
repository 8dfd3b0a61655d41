#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use stockrank::domain::error::StockrankError;
use stockrank::domain::fundamentals::{Fundamentals, InstrumentProfile};
pub use stockrank::domain::ohlcv::{PriceBar, PriceSeries};
use stockrank::ports::data_port::DataPort;

pub struct MockDataPort {
    pub prices: HashMap<String, Vec<PriceBar>>,
    pub fundamentals: HashMap<String, Fundamentals>,
    pub profiles: HashMap<String, InstrumentProfile>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            prices: HashMap::new(),
            fundamentals: HashMap::new(),
            profiles: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.prices.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_fundamentals(mut self, symbol: &str, fundamentals: Fundamentals) -> Self {
        self.fundamentals.insert(symbol.to_string(), fundamentals);
        self
    }

    pub fn with_profile(mut self, symbol: &str, name: &str, sector: &str) -> Self {
        self.profiles.insert(
            symbol.to_string(),
            InstrumentProfile {
                name: Some(name.to_string()),
                sector: Some(sector.to_string()),
                market_cap: None,
            },
        );
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    fn check(&self, symbol: &str) -> Result<(), StockrankError> {
        match self.errors.get(symbol) {
            Some(reason) => Err(StockrankError::Data {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(&self, symbol: &str) -> Result<PriceSeries, StockrankError> {
        self.check(symbol)?;
        match self.prices.get(symbol) {
            Some(bars) => PriceSeries::new(symbol, bars.clone()),
            None => Err(StockrankError::NoData {
                symbol: symbol.to_string(),
            }),
        }
    }

    fn fetch_fundamentals(&self, symbol: &str) -> Result<Option<Fundamentals>, StockrankError> {
        self.check(symbol)?;
        Ok(self.fundamentals.get(symbol).cloned())
    }

    fn fetch_profile(&self, symbol: &str) -> Result<Option<InstrumentProfile>, StockrankError> {
        self.check(symbol)?;
        Ok(self.profiles.get(symbol).cloned())
    }

    fn list_symbols(&self) -> Result<Vec<String>, StockrankError> {
        let mut symbols: Vec<String> = self.prices.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: NaiveDate, close: f64, volume: f64) -> PriceBar {
    PriceBar {
        date,
        open: close,
        high: close + 1.0,
        low: (close - 1.0).max(0.0),
        close,
        volume,
    }
}

/// Consecutive calendar days starting 2024-01-01.
pub fn bars_from_closes(closes: &[f64], volume: f64) -> Vec<PriceBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(start + chrono::Duration::days(i as i64), close, volume))
        .collect()
}

pub fn series_from_closes(symbol: &str, closes: &[f64]) -> PriceSeries {
    PriceSeries::new(symbol, bars_from_closes(closes, 1000.0)).unwrap()
}

/// A gently trending series with a deterministic wobble.
pub fn generate_bars(count: usize, start_price: f64, daily_drift: f64) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| {
            let trend = start_price * (1.0 + daily_drift).powi(i as i32);
            trend * (1.0 + 0.01 * (i as f64 * 0.9).sin())
        })
        .collect();
    bars_from_closes(&closes, 10_000.0)
}

/// P/E 10, ROE 20, dividend yield 3, beta 1.0.
pub fn value_fundamentals() -> Fundamentals {
    Fundamentals {
        pe_ratio: Some(10.0),
        roe: Some(20.0),
        dividend_yield: Some(3.0),
        beta: Some(1.0),
        ..Default::default()
    }
}
