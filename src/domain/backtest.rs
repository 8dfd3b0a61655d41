//! Historical replay of a constructed portfolio.
//!
//! Each holding is held at its (renormalized) weight and rebalanced daily
//! over the dates every surviving symbol traded.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::error::StockrankError;
use crate::domain::indicator::volatility::TRADING_DAYS_PER_YEAR;
use crate::domain::indicator::sample_stddev;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::portfolio::Portfolio;

pub const MIN_BACKTEST_BARS: usize = 100;
const DAYS_PER_YEAR: i64 = 365;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    /// Growth of one unit invested at the start.
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkComparison {
    pub symbol: String,
    pub annual_return: f64,
    pub excess_return: f64,
    pub outperformed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub years: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub symbols_tested: Vec<String>,
    pub symbols_skipped: Vec<String>,
    pub total_return: f64,
    pub annual_return: f64,
    pub annual_volatility: f64,
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough fall as a positive fraction.
    pub max_drawdown: f64,
    pub benchmark: Option<BenchmarkComparison>,
    pub equity_curve: Vec<EquityPoint>,
}

/// Replays `portfolio` over the last `years` of `prices`.
///
/// Holdings without a price series, or with fewer than
/// [`MIN_BACKTEST_BARS`] bars in the window, are skipped and the remaining
/// weights renormalized.
pub fn backtest_portfolio(
    portfolio: &Portfolio,
    prices: &BTreeMap<String, PriceSeries>,
    benchmark: Option<&PriceSeries>,
    years: u32,
) -> Result<BacktestReport, StockrankError> {
    if years == 0 {
        return Err(StockrankError::Data {
            reason: "backtest period must be at least one year".to_string(),
        });
    }

    let window_end = portfolio
        .holdings
        .iter()
        .filter_map(|h| prices.get(&h.symbol).and_then(PriceSeries::last))
        .map(|bar| bar.date)
        .max();
    let Some(window_end) = window_end else {
        return Err(insufficient(portfolio, 0));
    };
    let window_start = window_end - Duration::days(DAYS_PER_YEAR * i64::from(years));

    let mut survivors: Vec<(String, f64, BTreeMap<NaiveDate, f64>)> = Vec::new();
    let mut skipped = Vec::new();
    let mut most_bars = 0;

    for holding in &portfolio.holdings {
        let Some(series) = prices.get(&holding.symbol) else {
            skipped.push(holding.symbol.clone());
            continue;
        };
        let returns = windowed_returns(series, window_start);
        let bars = returns.len() + 1;
        most_bars = most_bars.max(bars);
        if bars < MIN_BACKTEST_BARS {
            skipped.push(holding.symbol.clone());
            continue;
        }
        survivors.push((holding.symbol.clone(), holding.weight, returns));
    }

    if survivors.is_empty() {
        return Err(insufficient(portfolio, most_bars));
    }

    let total_weight: f64 = survivors.iter().map(|(_, w, _)| w).sum();
    let equal_weight = 1.0 / survivors.len() as f64;

    let mut common: BTreeSet<NaiveDate> = survivors[0].2.keys().copied().collect();
    for (_, _, returns) in &survivors[1..] {
        common.retain(|d| returns.contains_key(d));
    }

    let daily: Vec<(NaiveDate, f64)> = common
        .iter()
        .map(|date| {
            let r = survivors
                .iter()
                .map(|(_, w, returns)| {
                    let weight = if total_weight > 0.0 {
                        w / total_weight
                    } else {
                        equal_weight
                    };
                    weight * returns.get(date).copied().unwrap_or(0.0)
                })
                .sum();
            (*date, r)
        })
        .collect();

    let (Some(&(start_date, _)), Some(&(end_date, _))) = (daily.first(), daily.last()) else {
        return Err(StockrankError::Data {
            reason: "holdings share no trading dates".to_string(),
        });
    };

    let returns: Vec<f64> = daily.iter().map(|(_, r)| *r).collect();
    let total_return = compound(&returns);
    let annual_return = annualize(total_return, years);
    let annual_volatility = if returns.len() >= 2 {
        sample_stddev(&returns) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };
    let sharpe_ratio = if annual_volatility > 0.0 {
        annual_return / annual_volatility
    } else {
        0.0
    };

    let mut value = 1.0;
    let equity_curve: Vec<EquityPoint> = daily
        .iter()
        .map(|(date, r)| {
            value *= 1.0 + r;
            EquityPoint { date: *date, value }
        })
        .collect();

    let benchmark = benchmark.map(|series| {
        let bench_returns = windowed_returns(series, window_start);
        let aligned: Vec<f64> = common
            .iter()
            .filter_map(|d| bench_returns.get(d).copied())
            .collect();
        let bench_annual = annualize(compound(&aligned), years);
        BenchmarkComparison {
            symbol: series.symbol().to_string(),
            annual_return: bench_annual,
            excess_return: annual_return - bench_annual,
            outperformed: annual_return > bench_annual,
        }
    });

    Ok(BacktestReport {
        years,
        start_date,
        end_date,
        symbols_tested: survivors.into_iter().map(|(s, _, _)| s).collect(),
        symbols_skipped: skipped,
        total_return,
        annual_return,
        annual_volatility,
        sharpe_ratio,
        max_drawdown: compute_drawdown(&equity_curve),
        benchmark,
        equity_curve,
    })
}

fn insufficient(portfolio: &Portfolio, bars: usize) -> StockrankError {
    let symbol = portfolio
        .holdings
        .iter()
        .map(|h| h.symbol.as_str())
        .collect::<Vec<_>>()
        .join(",");
    StockrankError::InsufficientData {
        symbol,
        bars,
        minimum: MIN_BACKTEST_BARS,
    }
}

/// Simple daily returns keyed by the later date, for bars on or after `start`.
fn windowed_returns(series: &PriceSeries, start: NaiveDate) -> BTreeMap<NaiveDate, f64> {
    let bars: Vec<_> = series.bars().iter().filter(|b| b.date >= start).collect();
    bars.windows(2)
        .map(|w| (w[1].date, w[1].close / w[0].close - 1.0))
        .collect()
}

fn compound(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

fn annualize(total_return: f64, years: u32) -> f64 {
    (1.0 + total_return).powf(1.0 / f64::from(years)) - 1.0
}

fn compute_drawdown(curve: &[EquityPoint]) -> f64 {
    let Some(first) = curve.first() else {
        return 0.0;
    };

    let mut peak = first.value.max(1.0);
    let mut max_dd = 0.0_f64;
    for point in curve {
        if point.value > peak {
            peak = point.value;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.value) / peak);
        }
    }
    max_dd
}
