//! Configuration access port.

use crate::domain::error::StockrankError;

/// Typed lookups by `[section] key`. Numeric and boolean getters fall back
/// to `default` when the key is absent or does not parse.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// Like `get_string`, but an absent key is a `ConfigMissing` error.
    fn require_string(&self, section: &str, key: &str) -> Result<String, StockrankError> {
        self.get_string(section, key)
            .ok_or_else(|| StockrankError::ConfigMissing {
                section: section.to_string(),
                key: key.to_string(),
            })
    }
}
