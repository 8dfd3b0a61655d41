//! Flat CSV reports: one row per bar or per holding.

use crate::domain::error::StockrankError;
use crate::domain::indicator_frame::IndicatorFrame;
use crate::ports::report_port::{RankingReport, ReportPort};
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct HoldingRow<'a> {
    rank: usize,
    symbol: &'a str,
    name: &'a str,
    sector: Option<&'a str>,
    weight: f64,
    score: f64,
    pe_ratio: Option<f64>,
    roe: Option<f64>,
    dividend_yield: Option<f64>,
    beta: Option<f64>,
    latest_price: Option<f64>,
    rationale: String,
}

pub struct CsvReportAdapter;

impl ReportPort for CsvReportAdapter {
    /// Holdings only; analytics and backtest figures have no tabular form.
    fn write_ranking(
        &self,
        report: &RankingReport<'_>,
        out: &mut dyn Write,
    ) -> Result<(), StockrankError> {
        let mut wtr = csv::Writer::from_writer(out);
        for (i, h) in report.portfolio.holdings.iter().enumerate() {
            wtr.serialize(HoldingRow {
                rank: i + 1,
                symbol: &h.symbol,
                name: &h.name,
                sector: h.sector.as_deref(),
                weight: h.weight,
                score: h.score,
                pe_ratio: h.metrics.pe_ratio,
                roe: h.metrics.roe,
                dividend_yield: h.metrics.dividend_yield,
                beta: h.metrics.beta,
                latest_price: h.metrics.latest_price,
                rationale: h.rationale.join("; "),
            })?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_indicators(
        &self,
        frame: &IndicatorFrame,
        out: &mut dyn Write,
    ) -> Result<(), StockrankError> {
        let mut wtr = csv::Writer::from_writer(out);
        for row in &frame.rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
