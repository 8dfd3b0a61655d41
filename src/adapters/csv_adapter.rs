//! CSV file data adapter.
//!
//! Prices live in `<price_dir>/<SYMBOL>.csv` with a
//! `date,open,high,low,close,volume` header. Fundamentals and profiles come
//! from a single optional table keyed by `symbol`; an empty cell is a
//! missing value.

use crate::domain::error::StockrankError;
use crate::domain::fundamentals::{Fundamentals, InstrumentProfile};
use crate::domain::ohlcv::{PriceBar, PriceSeries};
use crate::ports::data_port::DataPort;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FundamentalsRecord {
    symbol: String,
    name: Option<String>,
    sector: Option<String>,
    market_cap: Option<f64>,
    pe_ratio: Option<f64>,
    pb_ratio: Option<f64>,
    ps_ratio: Option<f64>,
    peg_ratio: Option<f64>,
    roe: Option<f64>,
    roa: Option<f64>,
    debt_equity: Option<f64>,
    current_ratio: Option<f64>,
    gross_margin: Option<f64>,
    operating_margin: Option<f64>,
    net_margin: Option<f64>,
    revenue_growth: Option<f64>,
    earnings_growth: Option<f64>,
    dividend_yield: Option<f64>,
    beta: Option<f64>,
    week52_high: Option<f64>,
    week52_low: Option<f64>,
    avg_volume: Option<f64>,
}

impl FundamentalsRecord {
    fn split(self) -> (String, Fundamentals, InstrumentProfile) {
        let fundamentals = Fundamentals {
            pe_ratio: self.pe_ratio,
            pb_ratio: self.pb_ratio,
            ps_ratio: self.ps_ratio,
            peg_ratio: self.peg_ratio,
            roe: self.roe,
            roa: self.roa,
            debt_equity: self.debt_equity,
            current_ratio: self.current_ratio,
            gross_margin: self.gross_margin,
            operating_margin: self.operating_margin,
            net_margin: self.net_margin,
            revenue_growth: self.revenue_growth,
            earnings_growth: self.earnings_growth,
            dividend_yield: self.dividend_yield,
            beta: self.beta,
            week52_high: self.week52_high,
            week52_low: self.week52_low,
            avg_volume: self.avg_volume,
        }
        .sanitized();
        let profile = InstrumentProfile {
            name: self.name.filter(|s| !s.trim().is_empty()),
            sector: self.sector.filter(|s| !s.trim().is_empty()),
            market_cap: self.market_cap.filter(|v| v.is_finite()),
        };
        (self.symbol.trim().to_uppercase(), fundamentals, profile)
    }
}

pub struct CsvAdapter {
    price_dir: PathBuf,
    fundamentals: BTreeMap<String, (Fundamentals, InstrumentProfile)>,
}

impl CsvAdapter {
    pub fn new(price_dir: PathBuf) -> Self {
        Self {
            price_dir,
            fundamentals: BTreeMap::new(),
        }
    }

    /// Loads the fundamentals table eagerly; later lookups are in memory.
    pub fn with_fundamentals<P: AsRef<Path>>(mut self, path: P) -> Result<Self, StockrankError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| StockrankError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        for result in rdr.deserialize::<FundamentalsRecord>() {
            let (symbol, fundamentals, profile) = result?.split();
            if symbol.is_empty() {
                return Err(StockrankError::Data {
                    reason: format!("row without symbol in {}", path.display()),
                });
            }
            self.fundamentals.insert(symbol, (fundamentals, profile));
        }
        Ok(self)
    }

    /// Symbols present in the fundamentals table, sorted.
    pub fn fundamentals_symbols(&self) -> Vec<String> {
        self.fundamentals.keys().cloned().collect()
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.price_dir.join(format!("{}.csv", symbol))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_prices(&self, symbol: &str) -> Result<PriceSeries, StockrankError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|_| StockrankError::NoData {
            symbol: symbol.to_string(),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let bars = rdr
            .deserialize::<PriceBar>()
            .collect::<Result<Vec<_>, _>>()?;

        if bars.is_empty() {
            return Err(StockrankError::NoData {
                symbol: symbol.to_string(),
            });
        }
        PriceSeries::from_unsorted(symbol, bars)
    }

    fn fetch_fundamentals(&self, symbol: &str) -> Result<Option<Fundamentals>, StockrankError> {
        Ok(self
            .fundamentals
            .get(&symbol.to_uppercase())
            .map(|(f, _)| f.clone()))
    }

    fn fetch_profile(&self, symbol: &str) -> Result<Option<InstrumentProfile>, StockrankError> {
        Ok(self
            .fundamentals
            .get(&symbol.to_uppercase())
            .map(|(_, p)| p.clone()))
    }

    fn list_symbols(&self) -> Result<Vec<String>, StockrankError> {
        let entries = fs::read_dir(&self.price_dir).map_err(|e| StockrankError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.price_dir.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if stem.eq_ignore_ascii_case("fundamentals") {
                    continue;
                }
                symbols.push(stem.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";

        fs::write(path.join("BHP.csv"), csv_content).unwrap();
        fs::write(path.join("CBA.csv"), "date,open,high,low,close,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "ignore me").unwrap();
        fs::write(
            path.join("fundamentals.csv"),
            "symbol,name,sector,market_cap,pe_ratio,roe,dividend_yield,beta\n\
             bhp,BHP Group,Materials,1.5e11,11.2,22.0,4.8,0.9\n\
             CBA,,,,,,,\n",
        )
        .unwrap();

        (dir, path)
    }

    #[test]
    fn fetch_prices_sorts_and_parses() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let series = adapter.fetch_prices("BHP").unwrap();

        assert_eq!(series.len(), 3);
        let first = series.first().unwrap();
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(first.open, 100.0);
        assert_eq!(first.high, 110.0);
        assert_eq!(first.low, 90.0);
        assert_eq!(first.close, 105.0);
        assert_eq!(first.volume, 50000.0);
    }

    #[test]
    fn fetch_prices_missing_file_is_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let result = adapter.fetch_prices("XYZ");
        assert!(matches!(result, Err(StockrankError::NoData { symbol }) if symbol == "XYZ"));
    }

    #[test]
    fn fetch_prices_header_only_is_no_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        assert!(matches!(
            adapter.fetch_prices("CBA"),
            Err(StockrankError::NoData { .. })
        ));
    }

    #[test]
    fn fetch_prices_rejects_duplicate_dates() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("DUP.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-15,1,1,1,1,10\n\
             2024-01-15,1,1,1,1,10\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(path);

        assert!(matches!(
            adapter.fetch_prices("DUP"),
            Err(StockrankError::InvalidSeries { .. })
        ));
    }

    #[test]
    fn fetch_prices_malformed_number_is_csv_error() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("BAD.csv"),
            "date,open,high,low,close,volume\n2024-01-15,abc,1,1,1,10\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(path);

        assert!(matches!(adapter.fetch_prices("BAD"), Err(StockrankError::Csv(_))));
    }

    #[test]
    fn fundamentals_lookup_is_case_insensitive() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path.clone())
            .with_fundamentals(path.join("fundamentals.csv"))
            .unwrap();

        let f = adapter.fetch_fundamentals("bhp").unwrap().unwrap();
        assert_eq!(f.pe_ratio, Some(11.2));
        assert_eq!(f.roe, Some(22.0));
        assert_eq!(f.pb_ratio, None);

        let profile = adapter.fetch_profile("BHP").unwrap().unwrap();
        assert_eq!(profile.name.as_deref(), Some("BHP Group"));
        assert_eq!(adapter.fundamentals_symbols(), vec!["BHP", "CBA"]);
        assert_eq!(profile.market_cap, Some(1.5e11));
    }

    #[test]
    fn empty_cells_are_missing() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path.clone())
            .with_fundamentals(path.join("fundamentals.csv"))
            .unwrap();

        let f = adapter.fetch_fundamentals("CBA").unwrap().unwrap();
        assert!(f.is_empty());
        let profile = adapter.fetch_profile("CBA").unwrap().unwrap();
        assert_eq!(profile.name, None);
    }

    #[test]
    fn unknown_symbol_has_no_fundamentals() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);
        assert_eq!(adapter.fetch_fundamentals("BHP").unwrap(), None);
    }

    #[test]
    fn list_symbols_skips_non_price_files() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let symbols = adapter.list_symbols().unwrap();
        assert_eq!(symbols, vec!["BHP", "CBA"]);
    }
}
