//! Core domain types and logic.

pub mod algorithm;
pub mod backtest;
pub mod business_day;
pub mod config_validation;
pub mod dividend;
pub mod drip;
pub mod error;
pub mod execution;
pub mod fee;
pub mod fundamentals;
pub mod metrics;
pub mod portfolio;
pub mod position;
pub mod selection;
pub mod strategy;
