//! Risk and diversification summary of a constructed portfolio.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::portfolio::Portfolio;

const UNKNOWN_SECTOR: &str = "Unknown";
const RISK_PER_BETA: f64 = 3.0;
const SHARPE_VOL_PER_BETA: f64 = 15.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioAnalytics {
    /// Weight-averaged beta of holdings that report one.
    pub portfolio_beta: Option<f64>,
    pub sector_distribution: BTreeMap<String, f64>,
    pub number_of_sectors: usize,
    pub herfindahl_index: f64,
    pub diversification_score: f64,
    /// 1 (calm) to 10 (volatile).
    pub risk_score: Option<f64>,
    pub sharpe_ratio: Option<f64>,
}

impl PortfolioAnalytics {
    /// `realized_return_pct` is the annual return in percent, typically from
    /// a backtest; without it no Sharpe ratio is reported.
    pub fn compute(
        portfolio: &Portfolio,
        risk_free_rate_pct: f64,
        realized_return_pct: Option<f64>,
    ) -> Self {
        let (weighted_beta, beta_weight) = portfolio
            .holdings
            .iter()
            .filter_map(|h| h.metrics.beta.map(|b| (b * h.weight, h.weight)))
            .fold((0.0, 0.0), |(sb, sw), (b, w)| (sb + b, sw + w));
        let portfolio_beta = (beta_weight > 0.0).then(|| weighted_beta / beta_weight);

        let mut sector_distribution: BTreeMap<String, f64> = BTreeMap::new();
        for h in &portfolio.holdings {
            let sector = h.sector.as_deref().unwrap_or(UNKNOWN_SECTOR);
            *sector_distribution.entry(sector.to_string()).or_insert(0.0) += h.weight;
        }

        // Concentration across sectors, not individual holdings.
        let herfindahl_index: f64 = sector_distribution
            .values()
            .map(|w| (w / 100.0).powi(2))
            .sum();
        let diversification_score = if portfolio.holdings.is_empty() {
            0.0
        } else {
            (100.0 - 100.0 * herfindahl_index).max(0.0)
        };

        let risk_score = portfolio_beta.map(|b| (RISK_PER_BETA * b).clamp(1.0, 10.0));
        let sharpe_ratio = match (portfolio_beta, realized_return_pct) {
            (Some(beta), Some(ret)) if beta > 0.0 => {
                Some((ret - risk_free_rate_pct) / (SHARPE_VOL_PER_BETA * beta))
            }
            _ => None,
        };

        Self {
            portfolio_beta,
            number_of_sectors: sector_distribution.len(),
            sector_distribution,
            herfindahl_index,
            diversification_score,
            risk_score,
            sharpe_ratio,
        }
    }
}
