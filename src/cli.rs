//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use crate::adapters::csv_market_adapter::CsvMarketAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::file_reference_adapter::FileReferenceAdapter;
use crate::domain::backtest::{
    BacktestConfig, BacktestResult, DEFAULT_INITIAL_CAPITAL, DEFAULT_START_DATE, ReplayHost,
};
use crate::domain::business_day::next_business_day;
use crate::domain::config_validation::{
    validate_backtest_config, validate_reference_sources, validate_strategy_config,
};
use crate::domain::error::PaydateError;
use crate::domain::fee::DEFAULT_FEE_RATE;
use crate::domain::metrics::Metrics;
use crate::domain::selection::YieldAttribution;
use crate::domain::strategy::{DividendPaydateStrategy, StrategyParams};
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::reference_data_port::ReferenceDataPort;

#[derive(Parser, Debug)]
#[command(name = "paydate", about = "Trading on the dividend payday")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay the strategy over local market data
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Validate config and load reference data without replaying
        #[arg(long)]
        dry_run: bool,
    },
    /// List tickers whose dividend is paid on the business day after a date
    Paydates {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        date: NaiveDate,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest { config, dry_run } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_backtest(&config)
            }
        }
        Command::Paydates { config, date } => run_paydates(&config, date),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, PaydateError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, PaydateError> {
    let (y, m, d) = DEFAULT_START_DATE;
    let start_date = match adapter.get_date("backtest", "start_date")? {
        Some(date) => date,
        None => NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| PaydateError::ConfigInvalid {
            section: "backtest".into(),
            key: "start_date".into(),
            reason: "invalid default start date".into(),
        })?,
    };
    let end_date =
        adapter
            .get_date("backtest", "end_date")?
            .ok_or_else(|| PaydateError::ConfigMissing {
                section: "backtest".into(),
                key: "end_date".into(),
            })?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: adapter.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL),
    })
}

pub fn build_strategy_params(adapter: &dyn ConfigPort) -> Result<StrategyParams, PaydateError> {
    validate_strategy_config(adapter)?;

    let defaults = StrategyParams::default();
    let yield_attribution = match adapter.get_string("strategy", "yield_attribution") {
        Some(raw) => raw
            .parse::<YieldAttribution>()
            .map_err(|reason| PaydateError::ConfigInvalid {
                section: "strategy".into(),
                key: "yield_attribution".into(),
                reason,
            })?,
        None => defaults.yield_attribution,
    };

    Ok(StrategyParams {
        fee_rate: adapter.get_double("strategy", "fee_rate", DEFAULT_FEE_RATE),
        selection_month_multiple: get_u32(
            adapter,
            "selection_month_multiple",
            defaults.selection_month_multiple,
        )?,
        rebalance_minutes_before_close: get_u32(
            adapter,
            "rebalance_minutes_before_close",
            defaults.rebalance_minutes_before_close,
        )?,
        yield_attribution,
    })
}

fn get_u32(adapter: &dyn ConfigPort, key: &str, default: u32) -> Result<u32, PaydateError> {
    let value = adapter.get_int("strategy", key, i64::from(default));
    u32::try_from(value).map_err(|_| PaydateError::ConfigInvalid {
        section: "strategy".into(),
        key: key.into(),
        reason: format!("{value} is out of range"),
    })
}

/// Local files when both paths are configured, otherwise the two URLs.
pub fn build_reference_port(
    adapter: &dyn ConfigPort,
) -> Result<Box<dyn ReferenceDataPort>, PaydateError> {
    validate_reference_sources(adapter)?;

    if let (Some(drips), Some(dividends)) = (
        adapter.get_string("data", "drip_tickers_path"),
        adapter.get_string("data", "dividend_dates_path"),
    ) {
        return Ok(Box::new(FileReferenceAdapter::new(
            PathBuf::from(drips),
            PathBuf::from(dividends),
        )));
    }

    #[cfg(feature = "http")]
    {
        use crate::adapters::http_reference_adapter::{
            DEFAULT_DIVIDEND_DATES_URL, DEFAULT_DRIP_TICKERS_URL, HttpReferenceAdapter,
        };

        let drips = adapter
            .get_string("data", "drip_tickers_url")
            .unwrap_or_else(|| DEFAULT_DRIP_TICKERS_URL.to_string());
        let dividends = adapter
            .get_string("data", "dividend_dates_url")
            .unwrap_or_else(|| DEFAULT_DIVIDEND_DATES_URL.to_string());
        Ok(Box::new(HttpReferenceAdapter::new(&drips, &dividends)?))
    }

    #[cfg(not(feature = "http"))]
    {
        Err(PaydateError::ConfigMissing {
            section: "data".into(),
            key: "drip_tickers_path".into(),
        })
    }
}

/// Validate everything a backtest needs.
pub fn validate_all(adapter: &dyn ConfigPort) -> Result<(), PaydateError> {
    validate_backtest_config(adapter)?;
    validate_strategy_config(adapter)?;
    validate_reference_sources(adapter)?;
    Ok(())
}

fn run_backtest(config_path: &Path) -> Result<(), PaydateError> {
    let adapter = load_config(config_path)?;
    validate_all(&adapter)?;

    let bt_config = build_backtest_config(&adapter)?;
    let params = build_strategy_params(&adapter)?;
    let reference = build_reference_port(&adapter)?;

    let prices = adapter
        .get_string("data", "prices_path")
        .unwrap_or_default();
    let fundamentals = adapter
        .get_string("data", "fundamentals_path")
        .unwrap_or_default();
    let market = CsvMarketAdapter::from_files(PathBuf::from(prices), PathBuf::from(fundamentals))?;

    let (result, metrics) = run_backtest_pipeline(&market, reference.as_ref(), &bt_config, params)?;
    print_summary(&bt_config, &result, &metrics);
    Ok(())
}

/// Initialize the strategy from reference data and replay it.
pub fn run_backtest_pipeline(
    market: &dyn MarketDataPort,
    reference: &dyn ReferenceDataPort,
    bt_config: &BacktestConfig,
    params: StrategyParams,
) -> Result<(BacktestResult, Metrics), PaydateError> {
    let mut strategy = DividendPaydateStrategy::initialize(params, reference)?;
    let host = ReplayHost::new(market, bt_config);
    let result = host.run(&mut strategy, bt_config.start_date, bt_config.end_date)?;
    let metrics = Metrics::compute(&result.portfolio);
    Ok((result, metrics))
}

fn print_summary(bt_config: &BacktestConfig, result: &BacktestResult, metrics: &Metrics) {
    println!("=== Trading on the Dividend Paydate ===");
    println!("Period:           {} to {}", bt_config.start_date, bt_config.end_date);
    println!("Trading Days:     {}", result.trading_days);
    println!("Initial Capital:  {:.2}", bt_config.initial_capital);
    println!("Final Equity:     {:.2}", metrics.final_equity);
    println!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    println!("Annualized:       {:.2}%", metrics.annualized_return * 100.0);
    println!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    println!("Total Trades:     {}", metrics.total_trades);
    println!("Win Rate:         {:.1}%", metrics.win_rate * 100.0);
    println!("Total Fees:       {:.2}", metrics.total_fees);
    println!("Universe Changes: {}", result.universe_changes);
    if !result.rejected.is_empty() {
        println!("Rejected Orders:  {}", result.rejected.len());
    }
}

fn run_dry_run(config_path: &Path) -> Result<(), PaydateError> {
    let adapter = load_config(config_path)?;
    validate_all(&adapter)?;
    let bt_config = build_backtest_config(&adapter)?;
    let params = build_strategy_params(&adapter)?;
    let reference = build_reference_port(&adapter)?;
    let strategy = DividendPaydateStrategy::initialize(params, reference.as_ref())?;

    println!("Config validated successfully");
    println!("  period:            {} to {}", bt_config.start_date, bt_config.end_date);
    println!("  initial capital:   {:.2}", bt_config.initial_capital);
    println!("  fee rate:          {}", strategy.params().fee_rate);
    println!("  yield attribution: {:?}", strategy.params().yield_attribution);
    println!("  paydays loaded:    {}", strategy.calendar().payday_count());
    println!("  dividend records:  {}", strategy.calendar().record_count());
    println!("Dry run complete: configuration is valid");
    Ok(())
}

fn run_paydates(config_path: &Path, date: NaiveDate) -> Result<(), PaydateError> {
    let adapter = load_config(config_path)?;
    let reference = build_reference_port(&adapter)?;
    let strategy =
        DividendPaydateStrategy::initialize(StrategyParams::default(), reference.as_ref())?;

    let next = next_business_day(date);
    match strategy.calendar().paying_on(next) {
        None => eprintln!("No dividends paid on {next}"),
        Some(payers) => {
            eprintln!("{} dividends paid on {next}:", payers.len());
            for info in payers.values() {
                let value = info
                    .dividend_value
                    .map(|v| format!("{v:.4}"))
                    .unwrap_or_else(|| "-".to_string());
                println!("{}\t{}\t{}", info.ticker, info.ex_div_date, value);
            }
        }
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), PaydateError> {
    let adapter = load_config(config_path)?;
    validate_all(&adapter)?;
    build_backtest_config(&adapter)?;
    build_strategy_params(&adapter)?;
    eprintln!("Configuration is valid.");
    Ok(())
}
