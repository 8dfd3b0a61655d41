//! Ranked, equal-weight portfolio construction.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::domain::fundamentals::{Fundamentals, InstrumentProfile};
use crate::domain::indicator_frame::LatestIndicatorRow;
use crate::domain::scoring::{composite_score, CompositeScore};
use crate::domain::summary::HistoricalSummary;

pub const DEFAULT_STRATEGY_NAME: &str = "Composite Value Strategy";
const GENERAL_RATIONALE: &str = "general value metrics";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingMetrics {
    pub pe_ratio: Option<f64>,
    pub roe: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
    pub latest_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Holding {
    pub symbol: String,
    pub name: String,
    pub sector: Option<String>,
    /// Percent of the portfolio; weights across holdings sum to 100.
    pub weight: f64,
    pub score: f64,
    pub metrics: HoldingMetrics,
    pub rationale: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioMetrics {
    pub avg_score: Option<f64>,
    pub avg_pe: Option<f64>,
    pub avg_roe: Option<f64>,
    pub avg_dividend_yield: Option<f64>,
    pub total_market_cap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Portfolio {
    pub strategy: String,
    pub created_at: DateTime<Utc>,
    pub target_size: usize,
    pub holdings: Vec<Holding>,
    pub metrics: PortfolioMetrics,
    /// Why the portfolio is empty, when it is.
    pub diagnostic: Option<String>,
}

impl Portfolio {
    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.holdings.iter().map(|h| h.weight).sum()
    }
}

/// Everything the constructor joins per symbol. Only symbols present in
/// `fundamentals` are scored; the other maps are optional enrichments.
#[derive(Debug, Clone, Default)]
pub struct ScoringInputs {
    pub fundamentals: BTreeMap<String, Fundamentals>,
    pub indicators: BTreeMap<String, LatestIndicatorRow>,
    pub summaries: BTreeMap<String, HistoricalSummary>,
    pub profiles: BTreeMap<String, InstrumentProfile>,
}

/// Scores every symbol with fundamentals and builds an equal-weight
/// portfolio from the top `target_size`, stamped with the current time.
pub fn score_and_rank(
    fundamentals: &BTreeMap<String, Fundamentals>,
    indicators: &BTreeMap<String, LatestIndicatorRow>,
    summaries: &BTreeMap<String, HistoricalSummary>,
    target_size: usize,
) -> Portfolio {
    construct(
        fundamentals,
        indicators,
        summaries,
        &BTreeMap::new(),
        target_size,
        DEFAULT_STRATEGY_NAME,
        Utc::now(),
    )
}

pub fn score_and_rank_with(
    inputs: &ScoringInputs,
    target_size: usize,
    strategy: &str,
    created_at: DateTime<Utc>,
) -> Portfolio {
    construct(
        &inputs.fundamentals,
        &inputs.indicators,
        &inputs.summaries,
        &inputs.profiles,
        target_size,
        strategy,
        created_at,
    )
}

/// Composite scores for every rankable symbol, best first. Ties are broken
/// by symbol so the order is deterministic.
pub fn rank_instruments(
    fundamentals: &BTreeMap<String, Fundamentals>,
    indicators: &BTreeMap<String, LatestIndicatorRow>,
    summaries: &BTreeMap<String, HistoricalSummary>,
) -> Vec<CompositeScore> {
    let mut scores: Vec<CompositeScore> = fundamentals
        .iter()
        .map(|(symbol, f)| composite_score(symbol, f, indicators.get(symbol), summaries.get(symbol)))
        .filter(CompositeScore::is_rankable)
        .collect();

    scores.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    scores
}

fn construct(
    fundamentals: &BTreeMap<String, Fundamentals>,
    indicators: &BTreeMap<String, LatestIndicatorRow>,
    summaries: &BTreeMap<String, HistoricalSummary>,
    profiles: &BTreeMap<String, InstrumentProfile>,
    target_size: usize,
    strategy: &str,
    created_at: DateTime<Utc>,
) -> Portfolio {
    let empty = |diagnostic: String| Portfolio {
        strategy: strategy.to_string(),
        created_at,
        target_size,
        holdings: Vec::new(),
        metrics: PortfolioMetrics::default(),
        diagnostic: Some(diagnostic),
    };

    if target_size == 0 {
        return empty("target size is zero".to_string());
    }

    let ranked = rank_instruments(fundamentals, indicators, summaries);
    if ranked.is_empty() {
        return empty(format!(
            "no valid instruments: none of {} scored above zero",
            fundamentals.len()
        ));
    }

    let selected: Vec<&CompositeScore> = ranked.iter().take(target_size).collect();
    let weight = 100.0 / selected.len() as f64;
    let no_fundamentals = Fundamentals::default();
    let no_profile = InstrumentProfile::default();

    let holdings: Vec<Holding> = selected
        .iter()
        .map(|scored| {
            let f = fundamentals.get(&scored.symbol).unwrap_or(&no_fundamentals);
            let profile = profiles.get(&scored.symbol).unwrap_or(&no_profile);
            let latest_price = summaries
                .get(&scored.symbol)
                .map(|s| s.latest_price)
                .or_else(|| indicators.get(&scored.symbol).map(|l| l.close));

            Holding {
                symbol: scored.symbol.clone(),
                name: profile.name.clone().unwrap_or_else(|| scored.symbol.clone()),
                sector: profile.sector.clone(),
                weight,
                score: scored.score,
                metrics: HoldingMetrics {
                    pe_ratio: f.pe_ratio,
                    roe: f.roe,
                    dividend_yield: f.dividend_yield,
                    beta: f.beta,
                    latest_price,
                },
                rationale: holding_rationale(f),
            }
        })
        .collect();

    let total_market_cap = holdings
        .iter()
        .filter_map(|h| profiles.get(&h.symbol).and_then(|p| p.market_cap))
        .sum();

    let metrics = PortfolioMetrics {
        avg_score: average(holdings.iter().map(|h| Some(h.score))),
        avg_pe: average(holdings.iter().map(|h| h.metrics.pe_ratio)),
        avg_roe: average(holdings.iter().map(|h| h.metrics.roe)),
        avg_dividend_yield: average(holdings.iter().map(|h| h.metrics.dividend_yield)),
        total_market_cap,
    };

    Portfolio {
        strategy: strategy.to_string(),
        created_at,
        target_size,
        holdings,
        metrics,
        diagnostic: None,
    }
}

/// Notable signals behind a holding. Explanatory only.
pub fn holding_rationale(f: &Fundamentals) -> Vec<String> {
    let mut rationale = Vec::new();

    if let Some(pe) = f.pe_ratio.filter(|&pe| pe > 0.0 && pe < 15.0) {
        rationale.push(format!("low P/E ({:.1})", pe));
    }
    if let Some(roe) = f.roe.filter(|&roe| roe > 15.0) {
        rationale.push(format!("high ROE ({:.1}%)", roe));
    }
    if let Some(dy) = f.dividend_yield.filter(|&dy| dy > 2.0) {
        rationale.push(format!("solid dividend ({:.2}%)", dy));
    }
    if let Some(beta) = f.beta.filter(|&b| (0.7..=1.3).contains(&b)) {
        rationale.push(format!("moderate risk (beta {:.2})", beta));
    }

    if rationale.is_empty() {
        rationale.push(GENERAL_RATIONALE.to_string());
    }
    rationale
}

fn average(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let present: Vec<f64> = values.flatten().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}
