//! Market data access port.

use crate::domain::error::StockrankError;
use crate::domain::fundamentals::{Fundamentals, InstrumentProfile};
use crate::domain::ohlcv::PriceSeries;

pub trait DataPort {
    /// Full daily history for `symbol`, oldest first.
    fn fetch_prices(&self, symbol: &str) -> Result<PriceSeries, StockrankError>;

    /// `Ok(None)` when the source simply has no fundamentals for `symbol`.
    fn fetch_fundamentals(&self, symbol: &str) -> Result<Option<Fundamentals>, StockrankError>;

    fn fetch_profile(&self, symbol: &str) -> Result<Option<InstrumentProfile>, StockrankError>;

    fn list_symbols(&self) -> Result<Vec<String>, StockrankError>;
}
