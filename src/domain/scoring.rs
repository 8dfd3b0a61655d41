//! Composite value score.
//!
//! Four sub-scores, each a weighted average of whichever components have a
//! valid input:
//!
//! | Sub-score | Weight | Components (inner weight)                               |
//! |-----------|--------|---------------------------------------------------------|
//! | Value     | 0.40   | P/E (0.5), P/B (0.3), revenue growth (0.2)              |
//! | Quality   | 0.30   | ROE (0.4), ROA (0.2), debt/equity (0.2), gross margin (0.2) |
//! | Dividend  | 0.20   | dividend yield (1.0)                                    |
//! | Risk      | 0.10   | beta (0.5), realized volatility (0.5)                   |
//!
//! A missing component leaves both the numerator and the denominator, so the
//! remaining components are renormalized. The top level works the same way
//! over the sub-scores that exist. Everything is clamped to [0, 100].

use serde::Serialize;

use crate::domain::fundamentals::Fundamentals;
use crate::domain::indicator_frame::LatestIndicatorRow;
use crate::domain::summary::HistoricalSummary;

pub const VALUE_WEIGHT: f64 = 0.4;
pub const QUALITY_WEIGHT: f64 = 0.3;
pub const DIVIDEND_WEIGHT: f64 = 0.2;
pub const RISK_WEIGHT: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubScore {
    pub score: f64,
    /// Labels of the components that contributed, in table order.
    pub components: Vec<&'static str>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub value: Option<SubScore>,
    pub quality: Option<SubScore>,
    pub dividend: Option<SubScore>,
    pub risk: Option<SubScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeScore {
    pub symbol: String,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    pub rationale: Vec<String>,
}

impl CompositeScore {
    /// Only instruments with a positive score are eligible for ranking.
    pub fn is_rankable(&self) -> bool {
        self.score > 0.0
    }
}

#[derive(Default)]
struct WeightedBlend {
    total: f64,
    weight: f64,
    used: Vec<&'static str>,
}

impl WeightedBlend {
    fn add(&mut self, label: &'static str, score: Option<f64>, weight: f64) {
        if let Some(score) = score {
            self.total += clamp_score(score) * weight;
            self.weight += weight;
            self.used.push(label);
        }
    }

    fn finish(self) -> Option<SubScore> {
        if self.weight > 0.0 {
            Some(SubScore {
                score: clamp_score(self.total / self.weight),
                components: self.used,
            })
        } else {
            None
        }
    }
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Lower P/E is better. Valid for P/E > 0.
pub fn pe_component(pe: Option<f64>) -> Option<f64> {
    pe.filter(|&pe| pe > 0.0).map(|pe| clamp_score(100.0 - pe * 2.0))
}

/// Lower P/B is better. Valid for P/B > 0.
pub fn pb_component(pb: Option<f64>) -> Option<f64> {
    pb.filter(|&pb| pb > 0.0).map(|pb| clamp_score(100.0 - pb * 20.0))
}

/// Peaks at 12.5% growth, 80 at the 5% and 20% edges of the sweet spot,
/// linear from zero below 5% and tapering above 20%. Symmetric and
/// continuous, unlike the stepped bands of older value screens that rise
/// through the whole 5-20% range.
pub fn revenue_growth_component(growth: Option<f64>) -> Option<f64> {
    growth.map(|g| {
        let score = if g < 5.0 {
            g * 16.0
        } else if g <= 20.0 {
            100.0 - (g - 12.5).abs() / 7.5 * 20.0
        } else {
            80.0 - (g - 20.0) * 2.0
        };
        clamp_score(score)
    })
}

/// ROE up to 50% scales to 100; above 100% is treated as unsustainable.
pub fn roe_component(roe: Option<f64>) -> Option<f64> {
    roe.filter(|&roe| roe > 0.0).map(|roe| {
        if roe > 100.0 {
            clamp_score(100.0 - (roe - 100.0) * 0.5)
        } else {
            clamp_score(roe * 2.0)
        }
    })
}

pub fn roa_component(roa: Option<f64>) -> Option<f64> {
    roa.filter(|&roa| roa > 0.0).map(|roa| clamp_score(roa * 5.0))
}

pub fn debt_equity_component(debt_equity: Option<f64>) -> Option<f64> {
    debt_equity
        .filter(|&de| de >= 0.0)
        .map(|de| clamp_score(100.0 - de * 2.0))
}

pub fn gross_margin_component(margin: Option<f64>) -> Option<f64> {
    margin.filter(|&gm| gm > 0.0).map(|gm| clamp_score(gm * 2.0))
}

/// Peaks at a 4% yield, 80 at the 2% and 6% edges, linear below 2% and
/// tapering above 6%. A symmetric peak rather than a stepped band, so a
/// yield past 4% is not rewarded further.
pub fn dividend_yield_component(dividend_yield: Option<f64>) -> Option<f64> {
    dividend_yield.filter(|&dy| dy > 0.0).map(|dy| {
        let score = if dy < 2.0 {
            dy * 40.0
        } else if dy <= 6.0 {
            100.0 - (dy - 4.0).abs() * 10.0
        } else {
            80.0 - (dy - 6.0) * 10.0
        };
        clamp_score(score)
    })
}

pub fn beta_component(beta: Option<f64>) -> Option<f64> {
    beta.filter(|&b| b > 0.0)
        .map(|b| clamp_score(100.0 - (b - 1.0).abs() * 50.0))
}

/// `volatility` is an annualized fraction (0.25 = 25%).
pub fn volatility_component(volatility: Option<f64>) -> Option<f64> {
    volatility
        .filter(|&v| v >= 0.0)
        .map(|v| clamp_score(100.0 - v * 200.0))
}

pub fn value_score(f: &Fundamentals) -> Option<SubScore> {
    let mut blend = WeightedBlend::default();
    blend.add("P/E", pe_component(f.pe_ratio), 0.5);
    blend.add("P/B", pb_component(f.pb_ratio), 0.3);
    blend.add("revenue growth", revenue_growth_component(f.revenue_growth), 0.2);
    blend.finish()
}

pub fn quality_score(f: &Fundamentals) -> Option<SubScore> {
    let mut blend = WeightedBlend::default();
    blend.add("ROE", roe_component(f.roe), 0.4);
    blend.add("ROA", roa_component(f.roa), 0.2);
    blend.add("debt/equity", debt_equity_component(f.debt_equity), 0.2);
    blend.add("gross margin", gross_margin_component(f.gross_margin), 0.2);
    blend.finish()
}

pub fn dividend_score(f: &Fundamentals) -> Option<SubScore> {
    let mut blend = WeightedBlend::default();
    blend.add("dividend yield", dividend_yield_component(f.dividend_yield), 1.0);
    blend.finish()
}

pub fn risk_score(f: &Fundamentals, volatility: Option<f64>) -> Option<SubScore> {
    let mut blend = WeightedBlend::default();
    blend.add("beta", beta_component(f.beta), 0.5);
    blend.add("volatility", volatility_component(volatility), 0.5);
    blend.finish()
}

/// Scores one instrument. Realized volatility comes from the historical
/// summary, falling back to the latest 20-day indicator volatility.
///
/// An instrument with no fundamentals at all scores 0 with an empty
/// breakdown, whatever its price history.
pub fn composite_score(
    symbol: &str,
    fundamentals: &Fundamentals,
    latest: Option<&LatestIndicatorRow>,
    summary: Option<&HistoricalSummary>,
) -> CompositeScore {
    if fundamentals.is_empty() {
        return CompositeScore {
            symbol: symbol.to_string(),
            score: 0.0,
            breakdown: ScoreBreakdown::default(),
            rationale: Vec::new(),
        };
    }

    let volatility = summary
        .and_then(|s| s.volatility)
        .or_else(|| latest.and_then(|l| l.volatility_20))
        .filter(|v| v.is_finite());

    let breakdown = ScoreBreakdown {
        value: value_score(fundamentals),
        quality: quality_score(fundamentals),
        dividend: dividend_score(fundamentals),
        risk: risk_score(fundamentals, volatility),
    };

    let parts = [
        ("value", &breakdown.value, VALUE_WEIGHT),
        ("quality", &breakdown.quality, QUALITY_WEIGHT),
        ("dividend", &breakdown.dividend, DIVIDEND_WEIGHT),
        ("risk", &breakdown.risk, RISK_WEIGHT),
    ];

    let mut total = 0.0;
    let mut weight = 0.0;
    let mut rationale = Vec::new();
    for (name, sub, w) in parts {
        if let Some(sub) = sub {
            total += sub.score * w;
            weight += w;
            rationale.push(format!(
                "{} {:.1} from {}",
                name,
                sub.score,
                sub.components.join(", ")
            ));
        }
    }

    let score = if weight > 0.0 {
        clamp_score(total / weight)
    } else {
        0.0
    };

    CompositeScore {
        symbol: symbol.to_string(),
        score,
        breakdown,
        rationale,
    }
}
