//! Report generation port.

use crate::domain::analytics::PortfolioAnalytics;
use crate::domain::backtest::BacktestReport;
use crate::domain::error::StockrankError;
use crate::domain::indicator_frame::IndicatorFrame;
use crate::domain::portfolio::Portfolio;
use crate::domain::universe::DataGap;
use serde::Serialize;
use std::io::Write;

/// Everything produced by one ranking run.
#[derive(Debug, Serialize)]
pub struct RankingReport<'a> {
    pub portfolio: &'a Portfolio,
    pub analytics: Option<&'a PortfolioAnalytics>,
    pub backtest: Option<&'a BacktestReport>,
    pub gaps: &'a [DataGap],
}

/// Port for writing results to a sink.
pub trait ReportPort {
    fn write_ranking(
        &self,
        report: &RankingReport<'_>,
        out: &mut dyn Write,
    ) -> Result<(), StockrankError>;

    fn write_indicators(
        &self,
        frame: &IndicatorFrame,
        out: &mut dyn Write,
    ) -> Result<(), StockrankError>;
}
