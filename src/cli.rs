//! CLI definition and dispatch.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::fallback_adapter::FallbackDataPort;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::analytics::PortfolioAnalytics;
use crate::domain::backtest::{backtest_portfolio, BacktestReport};
use crate::domain::config_validation::{
    validate_config, DEFAULT_BACKTEST_YEARS, DEFAULT_RISK_FREE_RATE, DEFAULT_TARGET_SIZE,
};
use crate::domain::error::StockrankError;
use crate::domain::indicator_frame::compute_indicators;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::portfolio::{score_and_rank_with, Portfolio, DEFAULT_STRATEGY_NAME};
use crate::domain::universe::{load_universe, parse_symbols, DataGap};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::{RankingReport, ReportPort};

#[derive(Parser, Debug)]
#[command(
    name = "stockrank",
    about = "Technical indicators, composite scoring and portfolio construction"
)]
pub struct Cli {
    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Annotate one symbol's price history with the standard indicator set
    Indicators {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Score the universe and build an equal-weight portfolio
    Rank {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [portfolio] target_size
        #[arg(long)]
        size: Option<usize>,
        /// Comma-separated symbols, overriding [data] symbols
        #[arg(long)]
        symbols: Option<String>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Copy CSV prices and fundamentals into the SQLite store
    #[cfg(feature = "sqlite")]
    Import {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Installs the stderr log subscriber; debug level with `--verbose`.
pub fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Indicators {
            config,
            symbol,
            format,
            output,
        } => run_indicators(&config, &symbol, format, output.as_deref()),
        Command::Rank {
            config,
            size,
            symbols,
            format,
            output,
        } => run_rank(&config, size, symbols.as_deref(), format, output.as_deref()),
        Command::Validate { config } => run_validate(&config),
        #[cfg(feature = "sqlite")]
        Command::Import { config } => run_import(&config),
    }
}

fn fail(err: &StockrankError) -> ExitCode {
    tracing::error!("{err}");
    err.into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    info!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

/// Settings for one ranking run, read from `[portfolio]` and `[backtest]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RankSettings {
    pub strategy_name: String,
    pub target_size: usize,
    pub risk_free_rate: f64,
    pub backtest_enabled: bool,
    pub backtest_years: u32,
    pub benchmark: Option<String>,
}

pub fn build_rank_settings(config: &dyn ConfigPort) -> RankSettings {
    RankSettings {
        strategy_name: config
            .get_string("portfolio", "strategy_name")
            .unwrap_or_else(|| DEFAULT_STRATEGY_NAME.to_string()),
        target_size: config
            .get_int("portfolio", "target_size", DEFAULT_TARGET_SIZE)
            .max(0) as usize,
        risk_free_rate: config.get_double("portfolio", "risk_free_rate", DEFAULT_RISK_FREE_RATE),
        backtest_enabled: config.get_bool("backtest", "enabled", false),
        backtest_years: config
            .get_int("backtest", "years", DEFAULT_BACKTEST_YEARS)
            .clamp(1, i64::from(u32::MAX)) as u32,
        benchmark: config
            .get_string("backtest", "benchmark")
            .map(|s| s.trim().to_uppercase()),
    }
}

/// Chains the configured providers: the SQLite store first when present,
/// then the CSV files.
pub fn build_data_port(config: &dyn ConfigPort) -> Result<FallbackDataPort, StockrankError> {
    let mut port = with_sqlite_provider(FallbackDataPort::new(), config)?;

    if let Some(price_dir) = config.get_string("data", "price_dir") {
        port = port.with_provider("csv", Box::new(build_csv_adapter(config, &price_dir)?));
    }

    if port.is_empty() {
        return Err(StockrankError::ConfigMissing {
            section: "data".into(),
            key: "price_dir".into(),
        });
    }
    Ok(port)
}

#[cfg(feature = "sqlite")]
fn with_sqlite_provider(
    port: FallbackDataPort,
    config: &dyn ConfigPort,
) -> Result<FallbackDataPort, StockrankError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    if config.get_string("data", "sqlite_path").is_none() {
        return Ok(port);
    }
    Ok(port.with_provider("sqlite", Box::new(SqliteAdapter::from_config(config)?)))
}

#[cfg(not(feature = "sqlite"))]
fn with_sqlite_provider(
    port: FallbackDataPort,
    _config: &dyn ConfigPort,
) -> Result<FallbackDataPort, StockrankError> {
    Ok(port)
}

fn build_csv_adapter(config: &dyn ConfigPort, price_dir: &str) -> Result<CsvAdapter, StockrankError> {
    let adapter = CsvAdapter::new(PathBuf::from(price_dir));
    match config.get_string("data", "fundamentals_file") {
        Some(path) => adapter.with_fundamentals(path),
        None => Ok(adapter),
    }
}

/// Symbols from the override, else `[data] symbols`, else every symbol the
/// data source lists.
pub fn resolve_symbols(
    symbols_override: Option<&str>,
    config: &dyn ConfigPort,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, StockrankError> {
    let (list, key) = match symbols_override {
        Some(s) => (Some(s.to_string()), "--symbols"),
        None => (config.get_string("data", "symbols"), "symbols"),
    };
    match list {
        Some(list) => parse_symbols(&list).map_err(|e| StockrankError::ConfigInvalid {
            section: "data".into(),
            key: key.into(),
            reason: e.to_string(),
        }),
        None => data_port.list_symbols(),
    }
}

fn write_output(
    output: Option<&Path>,
    write: impl FnOnce(&mut dyn Write) -> Result<(), StockrankError>,
) -> Result<(), StockrankError> {
    match output {
        Some(path) => {
            let mut file = BufWriter::new(File::create(path)?);
            write(&mut file)?;
            file.flush()?;
            info!("Output written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write(&mut lock)?;
            lock.flush()?;
        }
    }
    Ok(())
}

fn reporter(format: OutputFormat) -> Box<dyn ReportPort> {
    match format {
        OutputFormat::Json => Box::new(JsonReportAdapter),
        OutputFormat::Csv => Box::new(CsvReportAdapter),
    }
}

fn run_indicators(
    config_path: &Path,
    symbol: &str,
    format: OutputFormat,
    output: Option<&Path>,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data_port = match build_data_port(&config) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let symbol = symbol.trim().to_uppercase();
    let result = data_port
        .fetch_prices(&symbol)
        .and_then(|series| {
            info!(symbol = %symbol, bars = series.len(), "computing indicators");
            compute_indicators(&series)
        })
        .and_then(|frame| write_output(output, |out| reporter(format).write_indicators(&frame, out)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

/// Everything a ranking run produces, before it is written anywhere.
#[derive(Debug)]
pub struct RankOutcome {
    pub portfolio: Portfolio,
    pub analytics: PortfolioAnalytics,
    pub backtest: Option<BacktestReport>,
    pub gaps: Vec<DataGap>,
}

impl RankOutcome {
    pub fn report(&self) -> RankingReport<'_> {
        RankingReport {
            portfolio: &self.portfolio,
            analytics: Some(&self.analytics),
            backtest: self.backtest.as_ref(),
            gaps: &self.gaps,
        }
    }
}

/// Loads the universe, ranks it and, when enabled, replays the portfolio.
///
/// Data gaps and a failed backtest are logged and left out of the outcome
/// rather than failing the run.
pub fn run_rank_pipeline(
    data_port: &dyn DataPort,
    symbols: &[String],
    settings: &RankSettings,
    created_at: DateTime<Utc>,
) -> RankOutcome {
    info!("Loading data for {} symbols", symbols.len());
    let loaded = load_universe(data_port, symbols);
    for gap in &loaded.gaps {
        warn!("skipping {gap}");
    }
    debug!(
        fundamentals = loaded.inputs.fundamentals.len(),
        priced = loaded.prices.len(),
        "universe loaded"
    );

    let portfolio = score_and_rank_with(
        &loaded.inputs,
        settings.target_size,
        &settings.strategy_name,
        created_at,
    );
    match &portfolio.diagnostic {
        Some(reason) => warn!("empty portfolio: {reason}"),
        None => info!(
            "Selected {} of {} scored symbols",
            portfolio.holdings.len(),
            loaded.inputs.fundamentals.len()
        ),
    }

    let backtest = if settings.backtest_enabled && !portfolio.is_empty() {
        run_backtest_stage(data_port, &portfolio, &loaded.prices, settings)
    } else {
        None
    };

    let realized = backtest.as_ref().map(|b| b.annual_return * 100.0);
    let analytics = PortfolioAnalytics::compute(&portfolio, settings.risk_free_rate, realized);

    for (i, h) in portfolio.holdings.iter().enumerate() {
        info!(
            "{:>3}. {:<6} score {:>5.1}  weight {:>5.1}%  {}",
            i + 1,
            h.symbol,
            h.score,
            h.weight,
            h.rationale.join(", ")
        );
    }

    RankOutcome {
        portfolio,
        analytics,
        backtest,
        gaps: loaded.gaps,
    }
}

fn run_backtest_stage(
    data_port: &dyn DataPort,
    portfolio: &Portfolio,
    prices: &BTreeMap<String, PriceSeries>,
    settings: &RankSettings,
) -> Option<BacktestReport> {
    let benchmark = settings.benchmark.as_deref().and_then(|symbol| {
        data_port
            .fetch_prices(symbol)
            .map_err(|e| warn!(symbol = %symbol, error = %e, "benchmark unavailable"))
            .ok()
    });

    info!("Running {}-year backtest", settings.backtest_years);
    match backtest_portfolio(portfolio, prices, benchmark.as_ref(), settings.backtest_years) {
        Ok(report) => {
            info!(
                "Backtest: annual return {:.2}%, volatility {:.2}%, max drawdown {:.1}%",
                report.annual_return * 100.0,
                report.annual_volatility * 100.0,
                report.max_drawdown * 100.0
            );
            if let Some(bench) = &report.benchmark {
                info!(
                    "Benchmark {}: annual return {:.2}%, excess {:+.2}%",
                    bench.symbol,
                    bench.annual_return * 100.0,
                    bench.excess_return * 100.0
                );
            }
            Some(report)
        }
        Err(e) => {
            warn!(error = %e, "backtest skipped");
            None
        }
    }
}

fn run_rank(
    config_path: &Path,
    size_override: Option<usize>,
    symbols_override: Option<&str>,
    format: OutputFormat,
    output: Option<&Path>,
) -> ExitCode {
    // Stage 1: Load and validate config
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_config(&config) {
        return fail(&e);
    }

    let mut settings = build_rank_settings(&config);
    if let Some(size) = size_override {
        settings.target_size = size;
    }

    // Stage 2: Resolve data source and symbols
    let data_port = match build_data_port(&config) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    let symbols = match resolve_symbols(symbols_override, &config, &data_port) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    if symbols.is_empty() {
        return fail(&StockrankError::Data {
            reason: "no symbols configured or listed by the data source".into(),
        });
    }

    // Stage 3: Rank, analyse and optionally backtest
    let outcome = run_rank_pipeline(&data_port, &symbols, &settings, Utc::now());

    // Stage 4: Write report
    let report = outcome.report();
    match write_output(output, |out| reporter(format).write_ranking(&report, out)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(&e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_config(&config) {
        return fail(&e);
    }

    let settings = build_rank_settings(&config);
    info!("Strategy:        {}", settings.strategy_name);
    info!("Target size:     {}", settings.target_size);
    info!("Risk-free rate:  {:.2}%", settings.risk_free_rate);
    if settings.backtest_enabled {
        info!(
            "Backtest:        {} years vs {}",
            settings.backtest_years,
            settings.benchmark.as_deref().unwrap_or("no benchmark")
        );
    }
    info!("Configuration is valid.");
    ExitCode::SUCCESS
}

#[cfg(feature = "sqlite")]
fn run_import(config_path: &Path) -> ExitCode {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let result = config.require_string("data", "price_dir").and_then(|price_dir| {
        let csv = build_csv_adapter(&config, &price_dir)?;
        let store = SqliteAdapter::from_config(&config)?;
        import_into(&csv, &store)
    });
    match result {
        Ok((series, fundamentals)) => {
            info!("Imported {series} price series and {fundamentals} fundamentals rows");
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

/// Copies every CSV series and fundamentals row into `store`. Unreadable
/// price files are logged and skipped.
#[cfg(feature = "sqlite")]
pub fn import_into(
    csv: &CsvAdapter,
    store: &crate::adapters::sqlite_adapter::SqliteAdapter,
) -> Result<(usize, usize), StockrankError> {
    let mut series_count = 0;
    for symbol in csv.list_symbols()? {
        match csv.fetch_prices(&symbol) {
            Ok(series) => {
                store.insert_series(&series)?;
                debug!(symbol = %symbol, bars = series.len(), "imported prices");
                series_count += 1;
            }
            Err(e) => warn!(symbol = %symbol, error = %e, "skipping price file"),
        }
    }

    let mut fundamentals_count = 0;
    for symbol in csv.fundamentals_symbols() {
        if let Some(f) = csv.fetch_fundamentals(&symbol)? {
            let profile = csv.fetch_profile(&symbol)?.unwrap_or_default();
            store.upsert_fundamentals(&symbol, &f, &profile)?;
            fundamentals_count += 1;
        }
    }

    Ok((series_count, fundamentals_count))
}
