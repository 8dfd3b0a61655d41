//! Pretty-printed JSON reports.

use crate::domain::error::StockrankError;
use crate::domain::indicator_frame::IndicatorFrame;
use crate::ports::report_port::{RankingReport, ReportPort};
use std::io::Write;

pub struct JsonReportAdapter;

impl ReportPort for JsonReportAdapter {
    fn write_ranking(
        &self,
        report: &RankingReport<'_>,
        out: &mut dyn Write,
    ) -> Result<(), StockrankError> {
        serde_json::to_writer_pretty(&mut *out, report)?;
        writeln!(out)?;
        Ok(())
    }

    fn write_indicators(
        &self,
        frame: &IndicatorFrame,
        out: &mut dyn Write,
    ) -> Result<(), StockrankError> {
        serde_json::to_writer_pretty(&mut *out, frame)?;
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fundamentals::Fundamentals;
    use crate::domain::indicator_frame::compute_indicators;
    use crate::domain::ohlcv::{PriceBar, PriceSeries};
    use crate::domain::portfolio::{score_and_rank_with, ScoringInputs};
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn ranking_report_shape() {
        let mut inputs = ScoringInputs::default();
        inputs.fundamentals.insert(
            "KO".into(),
            Fundamentals {
                pe_ratio: Some(10.0),
                ..Default::default()
            },
        );
        let created = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let portfolio = score_and_rank_with(&inputs, 5, "Test", created);
        let report = RankingReport {
            portfolio: &portfolio,
            analytics: None,
            backtest: None,
            gaps: &[],
        };

        let mut buf = Vec::new();
        JsonReportAdapter.write_ranking(&report, &mut buf).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(json["portfolio"]["strategy"], "Test");
        assert_eq!(json["portfolio"]["holdings"][0]["symbol"], "KO");
        assert_eq!(json["portfolio"]["holdings"][0]["weight"], 100.0);
        assert!(json["portfolio"]["holdings"][0]["metrics"]["roe"].is_null());
        assert!(json["analytics"].is_null());
        assert!(json["backtest"].is_null());
    }

    #[test]
    fn indicator_frame_nulls() {
        let bar = PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 5.0,
            high: 5.0,
            low: 5.0,
            close: 5.0,
            volume: 10.0,
        };
        let frame = compute_indicators(&PriceSeries::new("KO", vec![bar]).unwrap()).unwrap();

        let mut buf = Vec::new();
        JsonReportAdapter.write_indicators(&frame, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("\"sma_20\": null"));
        assert!(!text.contains("NaN"));
    }
}
