//! Configuration validation.
//!
//! Validates every config field before a run starts.

use crate::domain::error::PaydateError;
use crate::domain::selection::YieldAttribution;
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), PaydateError> {
    validate_initial_capital(config)?;
    validate_dates(config)?;
    validate_market_data(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), PaydateError> {
    validate_fee_rate(config)?;
    validate_selection_month_multiple(config)?;
    validate_rebalance_minutes(config)?;
    validate_yield_attribution(config)?;
    Ok(())
}

/// Local reference files must be given as a pair.
pub fn validate_reference_sources(config: &dyn ConfigPort) -> Result<(), PaydateError> {
    let drip = config.get_string("data", "drip_tickers_path");
    let dividends = config.get_string("data", "dividend_dates_path");
    match (drip, dividends) {
        (Some(_), None) => Err(invalid(
            "data",
            "dividend_dates_path",
            "required when drip_tickers_path is set",
        )),
        (None, Some(_)) => Err(invalid(
            "data",
            "drip_tickers_path",
            "required when dividend_dates_path is set",
        )),
        _ => Ok(()),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> PaydateError {
    PaydateError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), PaydateError> {
    let value = config.get_double("backtest", "initial_capital", 100_000.0);
    if value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), PaydateError> {
    let start = config.get_date("backtest", "start_date")?;
    let end = config
        .get_date("backtest", "end_date")?
        .ok_or_else(|| PaydateError::ConfigMissing {
            section: "backtest".to_string(),
            key: "end_date".to_string(),
        })?;

    if let Some(start) = start {
        if start > end {
            return Err(invalid(
                "backtest",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}

fn validate_market_data(config: &dyn ConfigPort) -> Result<(), PaydateError> {
    for key in ["prices_path", "fundamentals_path"] {
        if config
            .get_string("data", key)
            .filter(|v| !v.trim().is_empty())
            .is_none()
        {
            return Err(PaydateError::ConfigMissing {
                section: "data".to_string(),
                key: key.to_string(),
            });
        }
    }
    Ok(())
}

fn validate_fee_rate(config: &dyn ConfigPort) -> Result<(), PaydateError> {
    let value = config.get_double("strategy", "fee_rate", 0.0);
    if value < 0.0 {
        return Err(invalid("strategy", "fee_rate", "fee_rate must be non-negative"));
    }
    Ok(())
}

fn validate_selection_month_multiple(config: &dyn ConfigPort) -> Result<(), PaydateError> {
    let value = config.get_int("strategy", "selection_month_multiple", 3);
    if !(1..=12).contains(&value) {
        return Err(invalid(
            "strategy",
            "selection_month_multiple",
            "selection_month_multiple must be between 1 and 12",
        ));
    }
    Ok(())
}

fn validate_rebalance_minutes(config: &dyn ConfigPort) -> Result<(), PaydateError> {
    let value = config.get_int("strategy", "rebalance_minutes_before_close", 16);
    if !(0..=390).contains(&value) {
        return Err(invalid(
            "strategy",
            "rebalance_minutes_before_close",
            "rebalance_minutes_before_close must be within the 390 minute session",
        ));
    }
    Ok(())
}

fn validate_yield_attribution(config: &dyn ConfigPort) -> Result<(), PaydateError> {
    if let Some(value) = config.get_string("strategy", "yield_attribution") {
        value
            .parse::<YieldAttribution>()
            .map_err(|reason| invalid("strategy", "yield_attribution", &reason))?;
    }
    Ok(())
}
