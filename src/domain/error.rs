//! Domain error types.
//!
//! Only I/O, configuration and malformed-input failures are errors. Missing
//! indicator history, missing fundamentals and an empty ranking are carried
//! as values (`None`, renormalized weights, a portfolio diagnostic).

/// Top-level error type for stockrank.
#[derive(Debug, thiserror::Error)]
pub enum StockrankError {
    #[error("data source error: {reason}")]
    Data { reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("invalid price series for {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StockrankError {
    /// Process exit status for this error category.
    pub fn exit_status(&self) -> u8 {
        match self {
            StockrankError::Io(_) | StockrankError::Json(_) => 1,
            StockrankError::ConfigParse { .. }
            | StockrankError::ConfigMissing { .. }
            | StockrankError::ConfigInvalid { .. } => 2,
            StockrankError::Data { .. }
            | StockrankError::Database { .. }
            | StockrankError::DatabaseQuery { .. }
            | StockrankError::Csv(_) => 3,
            StockrankError::InvalidSeries { .. } => 4,
            StockrankError::NoData { .. } | StockrankError::InsufficientData { .. } => 5,
        }
    }
}

impl From<&StockrankError> for std::process::ExitCode {
    fn from(err: &StockrankError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
