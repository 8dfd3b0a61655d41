//! Fundamental ratios and descriptive profile for one instrument.
//!
//! Every ratio is optional. Consumers must treat `None` as "unknown", never
//! as zero. Percent-like ratios (ROE, margins, growth, dividend yield) are
//! in percent units: 20.0 means 20%.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fundamentals {
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub ps_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub roe: Option<f64>,
    pub roa: Option<f64>,
    pub debt_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub gross_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub net_margin: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
    pub week52_high: Option<f64>,
    pub week52_low: Option<f64>,
    pub avg_volume: Option<f64>,
}

impl Fundamentals {
    /// Drops NaN and infinite values so they count as missing.
    pub fn sanitized(mut self) -> Self {
        for field in [
            &mut self.pe_ratio,
            &mut self.pb_ratio,
            &mut self.ps_ratio,
            &mut self.peg_ratio,
            &mut self.roe,
            &mut self.roa,
            &mut self.debt_equity,
            &mut self.current_ratio,
            &mut self.gross_margin,
            &mut self.operating_margin,
            &mut self.net_margin,
            &mut self.revenue_growth,
            &mut self.earnings_growth,
            &mut self.dividend_yield,
            &mut self.beta,
            &mut self.week52_high,
            &mut self.week52_low,
            &mut self.avg_volume,
        ] {
            if field.is_some_and(|v| !v.is_finite()) {
                *field = None;
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentProfile {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub market_cap: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert!(Fundamentals::default().is_empty());
        let f = Fundamentals {
            beta: Some(1.0),
            ..Default::default()
        };
        assert!(!f.is_empty());
    }

    #[test]
    fn sanitized_drops_non_finite() {
        let f = Fundamentals {
            pe_ratio: Some(f64::NAN),
            roe: Some(f64::INFINITY),
            beta: Some(1.1),
            ..Default::default()
        }
        .sanitized();

        assert_eq!(f.pe_ratio, None);
        assert_eq!(f.roe, None);
        assert_eq!(f.beta, Some(1.1));
    }

    #[test]
    fn deserializes_partial_json() {
        let f: Fundamentals = serde_json::from_str(r#"{"pe_ratio": 12.5, "beta": null}"#).unwrap();
        assert_eq!(f.pe_ratio, Some(12.5));
        assert_eq!(f.beta, None);
        assert_eq!(f.roe, None);
    }
}
