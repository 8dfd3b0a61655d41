//! Configuration validation.
//!
//! Runs before any data is loaded so a bad file fails fast with the
//! offending section and key.

use crate::domain::error::StockrankError;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_TARGET_SIZE: i64 = 10;
pub const DEFAULT_RISK_FREE_RATE: f64 = 2.0;
pub const DEFAULT_BACKTEST_YEARS: i64 = 5;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), StockrankError> {
    validate_data_source(config)?;
    validate_symbols(config)?;
    validate_target_size(config)?;
    validate_risk_free_rate(config)?;
    validate_backtest_years(config)?;
    Ok(())
}

fn validate_data_source(config: &dyn ConfigPort) -> Result<(), StockrankError> {
    let has_price_dir = config.get_string("data", "price_dir").is_some();
    let has_sqlite = cfg!(feature = "sqlite") && config.get_string("data", "sqlite_path").is_some();
    if has_price_dir || has_sqlite {
        Ok(())
    } else {
        Err(StockrankError::ConfigMissing {
            section: "data".to_string(),
            key: "price_dir".to_string(),
        })
    }
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), StockrankError> {
    match config.get_string("data", "symbols") {
        None => Ok(()),
        Some(list) => parse_symbols(&list)
            .map(|_| ())
            .map_err(|e| StockrankError::ConfigInvalid {
                section: "data".to_string(),
                key: "symbols".to_string(),
                reason: e.to_string(),
            }),
    }
}

fn validate_target_size(config: &dyn ConfigPort) -> Result<(), StockrankError> {
    let value = config.get_int("portfolio", "target_size", DEFAULT_TARGET_SIZE);
    if value < 1 {
        return Err(StockrankError::ConfigInvalid {
            section: "portfolio".to_string(),
            key: "target_size".to_string(),
            reason: "target_size must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), StockrankError> {
    let value = config.get_double("portfolio", "risk_free_rate", DEFAULT_RISK_FREE_RATE);
    if !(0.0..100.0).contains(&value) {
        return Err(StockrankError::ConfigInvalid {
            section: "portfolio".to_string(),
            key: "risk_free_rate".to_string(),
            reason: "risk_free_rate must be a percentage in [0, 100)".to_string(),
        });
    }
    Ok(())
}

fn validate_backtest_years(config: &dyn ConfigPort) -> Result<(), StockrankError> {
    let value = config.get_int("backtest", "years", DEFAULT_BACKTEST_YEARS);
    if value < 1 || value > i64::from(u32::MAX) {
        return Err(StockrankError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "years".to_string(),
            reason: "years must be a positive whole number".to_string(),
        });
    }
    Ok(())
}
