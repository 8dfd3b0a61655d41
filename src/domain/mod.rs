//! Core domain types and logic.

pub mod analytics;
pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod fundamentals;
pub mod indicator;
pub mod indicator_frame;
pub mod ohlcv;
pub mod portfolio;
pub mod scoring;
pub mod summary;
pub mod universe;
