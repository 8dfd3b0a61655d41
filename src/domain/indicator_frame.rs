//! Per-bar indicator annotation of a price series.
//!
//! `compute_indicators` runs every indicator over the full series and joins
//! the results bar by bar. Nothing is cached between calls.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::error::StockrankError;
use crate::domain::indicator::{
    bollinger, calculate_bollinger, calculate_ema, calculate_macd_default, calculate_returns,
    calculate_rsi, calculate_sma, calculate_volatility, calculate_volume_ratio,
    calculate_volume_sma, rsi, volatility, volume, IndicatorValue,
};
use crate::domain::ohlcv::PriceSeries;

const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;

/// One bar plus every derived field; `None` marks insufficient history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub ema_12: Option<f64>,
    pub ema_26: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub rsi: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub volume_sma: Option<f64>,
    pub volume_ratio: Option<f64>,
    pub daily_return: Option<f64>,
    pub volatility_20: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorFrame {
    pub symbol: String,
    pub rows: Vec<IndicatorRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendSignal {
    Bullish,
    Bearish,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MomentumSignal {
    Overbought,
    Oversold,
    Neutral,
}

/// Technical summary of the most recent bar, as consumed by scoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestIndicatorRow {
    pub date: NaiveDate,
    pub close: f64,
    pub rsi: Option<f64>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub macd: Option<f64>,
    pub volatility_20: Option<f64>,
    pub trend_signal: TrendSignal,
    pub momentum_signal: MomentumSignal,
}

impl IndicatorFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn latest(&self) -> Option<LatestIndicatorRow> {
        self.rows.last().map(LatestIndicatorRow::from_row)
    }
}

impl LatestIndicatorRow {
    pub fn from_row(row: &IndicatorRow) -> Self {
        let trend_signal = match row.sma_20 {
            Some(sma) if row.close > sma => TrendSignal::Bullish,
            Some(_) => TrendSignal::Bearish,
            None => TrendSignal::Unknown,
        };
        let momentum_signal = match row.rsi {
            Some(rsi) if rsi > RSI_OVERBOUGHT => MomentumSignal::Overbought,
            Some(rsi) if rsi < RSI_OVERSOLD => MomentumSignal::Oversold,
            _ => MomentumSignal::Neutral,
        };

        Self {
            date: row.date,
            close: row.close,
            rsi: row.rsi,
            sma_20: row.sma_20,
            sma_50: row.sma_50,
            macd: row.macd,
            volatility_20: row.volatility_20,
            trend_signal,
            momentum_signal,
        }
    }
}

/// Annotates every bar of `series` with the standard indicator set.
///
/// Fails only for an empty series; short series simply leave the affected
/// fields undefined.
pub fn compute_indicators(series: &PriceSeries) -> Result<IndicatorFrame, StockrankError> {
    if series.is_empty() {
        return Err(StockrankError::InsufficientData {
            symbol: series.symbol().to_string(),
            bars: 0,
            minimum: 1,
        });
    }

    let sma_20 = calculate_sma(series, 20).simple_values();
    let sma_50 = calculate_sma(series, 50).simple_values();
    let sma_200 = calculate_sma(series, 200).simple_values();
    let ema_12 = calculate_ema(series, 12).simple_values();
    let ema_26 = calculate_ema(series, 26).simple_values();
    let macd = calculate_macd_default(series);
    let rsi = calculate_rsi(series, rsi::DEFAULT_PERIOD).simple_values();
    let bands = calculate_bollinger(series, bollinger::DEFAULT_PERIOD, bollinger::DEFAULT_MULT_X100);
    let volume_sma = calculate_volume_sma(series, volume::DEFAULT_PERIOD).simple_values();
    let volume_ratio = calculate_volume_ratio(series, volume::DEFAULT_PERIOD).simple_values();
    let returns = calculate_returns(series).simple_values();
    let volatility_20 = calculate_volatility(series, volatility::DEFAULT_PERIOD).simple_values();

    let rows = series
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let (macd_line, macd_signal, macd_histogram) = match macd.values[i].value {
                Some(IndicatorValue::Macd {
                    line,
                    signal,
                    histogram,
                }) => (Some(line), Some(signal), Some(histogram)),
                _ => (None, None, None),
            };
            let (bb_upper, bb_middle, bb_lower) = match bands.values[i].value {
                Some(IndicatorValue::Bollinger {
                    upper,
                    middle,
                    lower,
                }) => (Some(upper), Some(middle), Some(lower)),
                _ => (None, None, None),
            };

            IndicatorRow {
                date: bar.date,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
                sma_20: sma_20[i],
                sma_50: sma_50[i],
                sma_200: sma_200[i],
                ema_12: ema_12[i],
                ema_26: ema_26[i],
                macd: macd_line,
                macd_signal,
                macd_histogram,
                rsi: rsi[i],
                bb_upper,
                bb_middle,
                bb_lower,
                volume_sma: volume_sma[i],
                volume_ratio: volume_ratio[i],
                daily_return: returns[i],
                volatility_20: volatility_20[i],
            }
        })
        .collect();

    Ok(IndicatorFrame {
        symbol: series.symbol().to_string(),
        rows,
    })
}
