//! Symbol universe: parsing configured symbol lists and gathering the
//! per-symbol inputs the ranking needs.

use crate::domain::error::StockrankError;
use crate::domain::indicator_frame::compute_indicators;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::portfolio::ScoringInputs;
use crate::domain::summary::HistoricalSummary;
use crate::ports::data_port::DataPort;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

/// Splits a comma-separated list into upper-cased symbols, rejecting empty
/// tokens and duplicates.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GapKind {
    Prices,
    Fundamentals,
    Profile,
}

/// A piece of data that could not be loaded for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataGap {
    pub symbol: String,
    pub kind: GapKind,
    pub reason: String,
}

impl fmt::Display for DataGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            GapKind::Prices => "prices",
            GapKind::Fundamentals => "fundamentals",
            GapKind::Profile => "profile",
        };
        write!(f, "{} {}: {}", self.symbol, kind, self.reason)
    }
}

#[derive(Debug, Default)]
pub struct LoadedUniverse {
    pub inputs: ScoringInputs,
    pub prices: BTreeMap<String, PriceSeries>,
    pub gaps: Vec<DataGap>,
}

/// Fetches prices, fundamentals and profiles for every symbol and derives
/// the latest indicator row and historical summary from the prices.
///
/// A failed fetch is recorded as a [`DataGap`] and the symbol continues with
/// whatever else loaded; only symbols with fundamentals can later rank.
pub fn load_universe(data_port: &dyn DataPort, symbols: &[String]) -> LoadedUniverse {
    let mut loaded = LoadedUniverse::default();

    for symbol in symbols {
        let gap = |kind: GapKind, e: StockrankError| DataGap {
            symbol: symbol.clone(),
            kind,
            reason: e.to_string(),
        };

        match data_port.fetch_prices(symbol) {
            Ok(series) => {
                if let Ok(frame) = compute_indicators(&series) {
                    if let Some(latest) = frame.latest() {
                        loaded.inputs.indicators.insert(symbol.clone(), latest);
                    }
                }
                match HistoricalSummary::from_series(&series) {
                    Ok(summary) => {
                        loaded.inputs.summaries.insert(symbol.clone(), summary);
                    }
                    Err(e) => loaded.gaps.push(gap(GapKind::Prices, e)),
                }
                loaded.prices.insert(symbol.clone(), series);
            }
            Err(e) => loaded.gaps.push(gap(GapKind::Prices, e)),
        }

        match data_port.fetch_fundamentals(symbol) {
            Ok(Some(f)) => {
                loaded.inputs.fundamentals.insert(symbol.clone(), f);
            }
            Ok(None) => {}
            Err(e) => loaded.gaps.push(gap(GapKind::Fundamentals, e)),
        }

        match data_port.fetch_profile(symbol) {
            Ok(Some(p)) => {
                loaded.inputs.profiles.insert(symbol.clone(), p);
            }
            Ok(None) => {}
            Err(e) => loaded.gaps.push(gap(GapKind::Profile, e)),
        }
    }

    loaded
}
