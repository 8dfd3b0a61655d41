//! Provider fallback chain.
//!
//! Each call tries the inner providers in order and returns the first
//! success. Failures are logged and the last error is surfaced when every
//! provider fails.

use crate::domain::error::StockrankError;
use crate::domain::fundamentals::{Fundamentals, InstrumentProfile};
use crate::domain::ohlcv::PriceSeries;
use crate::ports::data_port::DataPort;
use std::collections::BTreeSet;
use tracing::{debug, warn};

pub struct FallbackDataPort {
    providers: Vec<(String, Box<dyn DataPort>)>,
}

impl FallbackDataPort {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    pub fn with_provider(mut self, name: impl Into<String>, provider: Box<dyn DataPort>) -> Self {
        self.providers.push((name.into(), provider));
        self
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn first_success<T>(
        &self,
        operation: &str,
        symbol: &str,
        call: impl Fn(&dyn DataPort) -> Result<T, StockrankError>,
    ) -> Result<T, StockrankError> {
        let mut last_error = None;
        for (name, provider) in &self.providers {
            match call(provider.as_ref()) {
                Ok(value) => {
                    debug!(provider = %name, symbol = %symbol, operation, "provider succeeded");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(provider = %name, symbol = %symbol, operation, error = %e, "provider failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| StockrankError::Data {
            reason: "no data providers configured".to_string(),
        }))
    }

    /// Like [`first_success`](Self::first_success) but an `Ok(None)` also
    /// falls through to the next provider. The result is `Ok(None)` only if
    /// some provider answered without a record; if every provider failed,
    /// the last error is returned.
    fn first_present<T>(
        &self,
        operation: &str,
        symbol: &str,
        call: impl Fn(&dyn DataPort) -> Result<Option<T>, StockrankError>,
    ) -> Result<Option<T>, StockrankError> {
        let mut last_error = None;
        let mut answered = false;
        for (name, provider) in &self.providers {
            match call(provider.as_ref()) {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => {
                    answered = true;
                    debug!(provider = %name, symbol = %symbol, operation, "provider has no record");
                }
                Err(e) => {
                    warn!(provider = %name, symbol = %symbol, operation, error = %e, "provider failed");
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(None),
        }
    }
}

impl Default for FallbackDataPort {
    fn default() -> Self {
        Self::new()
    }
}

impl DataPort for FallbackDataPort {
    fn fetch_prices(&self, symbol: &str) -> Result<PriceSeries, StockrankError> {
        self.first_success("fetch_prices", symbol, |p| p.fetch_prices(symbol))
    }

    fn fetch_fundamentals(&self, symbol: &str) -> Result<Option<Fundamentals>, StockrankError> {
        self.first_present("fetch_fundamentals", symbol, |p| p.fetch_fundamentals(symbol))
    }

    fn fetch_profile(&self, symbol: &str) -> Result<Option<InstrumentProfile>, StockrankError> {
        self.first_present("fetch_profile", symbol, |p| p.fetch_profile(symbol))
    }

    /// Union of every provider's symbols; a failing provider contributes none.
    fn list_symbols(&self) -> Result<Vec<String>, StockrankError> {
        let mut symbols = BTreeSet::new();
        let mut last_error = None;
        let mut any_ok = false;
        for (name, provider) in &self.providers {
            match provider.list_symbols() {
                Ok(list) => {
                    any_ok = true;
                    symbols.extend(list);
                }
                Err(e) => {
                    warn!(provider = %name, error = %e, "listing symbols failed");
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(e) if !any_ok => Err(e),
            _ => Ok(symbols.into_iter().collect()),
        }
    }
}
