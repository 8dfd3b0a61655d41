//! SQLite market data store.
//!
//! Holds daily prices plus one fundamentals/profile row per symbol, so a
//! universe imported once from CSV can be ranked repeatedly.

use crate::domain::error::StockrankError;
use crate::domain::fundamentals::{Fundamentals, InstrumentProfile};
use crate::domain::ohlcv::{PriceBar, PriceSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> StockrankError {
    StockrankError::Database {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> StockrankError {
    StockrankError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StockrankError> {
        let db_path = config.require_string("data", "sqlite_path")?;

        let pool_size = config.get_int("data", "sqlite_pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, StockrankError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StockrankError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), StockrankError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS prices (
                    symbol TEXT NOT NULL,
                    date TEXT NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    volume REAL NOT NULL,
                    PRIMARY KEY (symbol, date)
                );
                CREATE TABLE IF NOT EXISTS fundamentals (
                    symbol TEXT PRIMARY KEY,
                    name TEXT,
                    sector TEXT,
                    market_cap REAL,
                    metrics TEXT NOT NULL
                );",
            )
            .map_err(query_error)
    }

    /// Replaces any stored bars for the series' symbol on the same dates.
    /// Symbols are stored upper-cased.
    pub fn insert_series(&self, series: &PriceSeries) -> Result<(), StockrankError> {
        let symbol = series.symbol().to_uppercase();
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for bar in series.bars() {
            tx.execute(
                "INSERT OR REPLACE INTO prices (symbol, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    symbol,
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)
    }

    pub fn upsert_fundamentals(
        &self,
        symbol: &str,
        fundamentals: &Fundamentals,
        profile: &InstrumentProfile,
    ) -> Result<(), StockrankError> {
        let metrics = serde_json::to_string(fundamentals)?;
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO fundamentals (symbol, name, sector, market_cap, metrics)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    symbol.to_uppercase(),
                    profile.name,
                    profile.sector,
                    profile.market_cap,
                    metrics
                ],
            )
            .map_err(query_error)?;
        Ok(())
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_prices(&self, symbol: &str) -> Result<PriceSeries, StockrankError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT date, open, high, low, close, volume
                 FROM prices WHERE symbol = ?1 ORDER BY date ASC",
            )
            .map_err(query_error)?;

        let rows = stmt
            .query_map(params![symbol.to_uppercase()], |row| {
                let date_str: String = row.get(0)?;
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(PriceBar {
                    date,
                    open: row.get(1)?,
                    high: row.get(2)?,
                    low: row.get(3)?,
                    close: row.get(4)?,
                    volume: row.get(5)?,
                })
            })
            .map_err(query_error)?;

        let bars = rows.collect::<Result<Vec<_>, _>>().map_err(query_error)?;
        if bars.is_empty() {
            return Err(StockrankError::NoData {
                symbol: symbol.to_string(),
            });
        }
        PriceSeries::new(symbol.to_uppercase(), bars)
    }

    fn fetch_fundamentals(&self, symbol: &str) -> Result<Option<Fundamentals>, StockrankError> {
        let metrics: Option<String> = self
            .conn()?
            .query_row(
                "SELECT metrics FROM fundamentals WHERE symbol = ?1",
                params![symbol.to_uppercase()],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_error)?;

        match metrics {
            Some(json) => Ok(Some(serde_json::from_str::<Fundamentals>(&json)?.sanitized())),
            None => Ok(None),
        }
    }

    fn fetch_profile(&self, symbol: &str) -> Result<Option<InstrumentProfile>, StockrankError> {
        self.conn()?
            .query_row(
                "SELECT name, sector, market_cap FROM fundamentals WHERE symbol = ?1",
                params![symbol.to_uppercase()],
                |row| {
                    Ok(InstrumentProfile {
                        name: row.get(0)?,
                        sector: row.get(1)?,
                        market_cap: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(query_error)
    }

    fn list_symbols(&self) -> Result<Vec<String>, StockrankError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM prices ORDER BY symbol")
            .map_err(query_error)?;

        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(query_error)?;

        rows.collect::<Result<Vec<String>, _>>().map_err(query_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    fn make_series(symbol: &str, closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
            })
            .collect();
        PriceSeries::new(symbol, bars).unwrap()
    }

    fn store() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
    }

    #[test]
    fn from_config_missing_path() {
        let result = SqliteAdapter::from_config(&EmptyConfig);
        match result {
            Err(StockrankError::ConfigMissing { section, key }) => {
                assert_eq!(section, "data");
                assert_eq!(key, "sqlite_path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn prices_round_trip() {
        let adapter = store();
        let series = make_series("BHP", &[10.0, 11.0, 12.5]);
        adapter.insert_series(&series).unwrap();

        let fetched = adapter.fetch_prices("BHP").unwrap();
        assert_eq!(fetched, series);
    }

    #[test]
    fn reinserting_replaces_bars() {
        let adapter = store();
        adapter.insert_series(&make_series("BHP", &[10.0, 11.0])).unwrap();
        adapter.insert_series(&make_series("BHP", &[20.0, 21.0])).unwrap();

        let fetched = adapter.fetch_prices("BHP").unwrap();
        assert_eq!(fetched.closes(), vec![20.0, 21.0]);
    }

    #[test]
    fn unknown_symbol_is_no_data() {
        let adapter = store();
        assert!(matches!(
            adapter.fetch_prices("XYZ"),
            Err(StockrankError::NoData { .. })
        ));
    }

    #[test]
    fn fundamentals_and_profile() {
        let adapter = store();
        let fundamentals = Fundamentals {
            pe_ratio: Some(12.0),
            beta: Some(0.9),
            ..Default::default()
        };
        let profile = InstrumentProfile {
            name: Some("BHP Group".into()),
            sector: None,
            market_cap: Some(1.5e11),
        };
        adapter.upsert_fundamentals("bhp", &fundamentals, &profile).unwrap();

        assert_eq!(adapter.fetch_fundamentals("BHP").unwrap(), Some(fundamentals));
        assert_eq!(adapter.fetch_profile("BHP").unwrap(), Some(profile));
        assert_eq!(adapter.fetch_fundamentals("CBA").unwrap(), None);
        assert_eq!(adapter.fetch_profile("CBA").unwrap(), None);
    }

    #[test]
    fn symbol_case_is_normalized() {
        let adapter = store();
        adapter.insert_series(&make_series("bhp", &[10.0, 11.0])).unwrap();

        assert_eq!(adapter.fetch_prices("BHP").unwrap().closes(), vec![10.0, 11.0]);
        assert_eq!(adapter.fetch_prices("Bhp").unwrap().len(), 2);
        assert_eq!(adapter.list_symbols().unwrap(), vec!["BHP"]);
    }

    #[test]
    fn list_symbols_sorted() {
        let adapter = store();
        adapter.insert_series(&make_series("WBC", &[1.0])).unwrap();
        adapter.insert_series(&make_series("BHP", &[1.0])).unwrap();

        assert_eq!(adapter.list_symbols().unwrap(), vec!["BHP", "WBC"]);
    }
}
