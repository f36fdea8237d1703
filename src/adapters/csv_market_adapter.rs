//! CSV market data adapter for replays.
//!
//! Two files, loaded once:
//!
//! - prices: `date,symbol,close`
//! - fundamentals: `date,symbol,exchange_id,market_cap,price,pe_ratio,basic_eps_ttm,operating_cash_flow_ttm,net_income_ttm`
//!
//! The coarse universe on a date is every symbol with a close that day.
//! Fundamentals are served as of the latest row dated on or before the query
//! date. Empty cash flow / net income cells mean "not reported".

use crate::domain::error::PaydateError;
use crate::domain::fundamentals::{CoarseFundamental, FineFundamental};
use crate::ports::market_data_port::MarketDataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct PriceRow {
    date: String,
    symbol: String,
    close: f64,
}

#[derive(Debug, Deserialize)]
struct FundamentalRow {
    date: String,
    symbol: String,
    exchange_id: String,
    market_cap: f64,
    price: f64,
    pe_ratio: f64,
    basic_eps_ttm: f64,
    operating_cash_flow_ttm: Option<f64>,
    net_income_ttm: Option<f64>,
}

pub struct CsvMarketAdapter {
    closes: BTreeMap<NaiveDate, HashMap<String, f64>>,
    /// Per symbol, rows ordered by date.
    fundamentals: HashMap<String, BTreeMap<NaiveDate, FineFundamental>>,
}

impl CsvMarketAdapter {
    pub fn from_files<P: AsRef<Path>>(prices: P, fundamentals: P) -> Result<Self, PaydateError> {
        let prices_text = read(prices.as_ref())?;
        let fundamentals_text = read(fundamentals.as_ref())?;
        let adapter = Self::from_strings(&prices_text, &fundamentals_text)?;
        info!(
            dates = adapter.closes.len(),
            symbols_with_fundamentals = adapter.fundamentals.len(),
            "market data loaded"
        );
        Ok(adapter)
    }

    pub fn from_strings(prices: &str, fundamentals: &str) -> Result<Self, PaydateError> {
        let mut closes: BTreeMap<NaiveDate, HashMap<String, f64>> = BTreeMap::new();
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(prices.as_bytes());
        for result in rdr.deserialize::<PriceRow>() {
            let row = result.map_err(|e| PaydateError::MarketData {
                reason: format!("prices CSV: {e}"),
            })?;
            let date = parse_date(&row.date)?;
            closes.entry(date).or_default().insert(row.symbol, row.close);
        }

        let mut by_symbol: HashMap<String, BTreeMap<NaiveDate, FineFundamental>> = HashMap::new();
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(fundamentals.as_bytes());
        for result in rdr.deserialize::<FundamentalRow>() {
            let row = result.map_err(|e| PaydateError::MarketData {
                reason: format!("fundamentals CSV: {e}"),
            })?;
            let date = parse_date(&row.date)?;
            let fine = FineFundamental {
                market_cap: row.market_cap,
                price: row.price,
                pe_ratio: row.pe_ratio,
                basic_eps_ttm: row.basic_eps_ttm,
                operating_cash_flow_ttm: row.operating_cash_flow_ttm,
                net_income_ttm: row.net_income_ttm,
                ..FineFundamental::new(&row.symbol, &row.exchange_id)
            };
            by_symbol.entry(row.symbol).or_default().insert(date, fine);
        }

        Ok(Self {
            closes,
            fundamentals: by_symbol,
        })
    }
}

fn read(path: &Path) -> Result<String, PaydateError> {
    fs::read_to_string(path).map_err(|e| PaydateError::MarketData {
        reason: format!("failed to read {}: {}", path.display(), e),
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate, PaydateError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| PaydateError::MarketData {
        reason: format!("invalid date {raw:?}: {e}"),
    })
}

impl MarketDataPort for CsvMarketAdapter {
    fn trading_dates(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, PaydateError> {
        if start > end {
            return Ok(Vec::new());
        }
        Ok(self.closes.range(start..=end).map(|(d, _)| *d).collect())
    }

    fn closing_prices(&self, date: NaiveDate) -> Result<HashMap<String, f64>, PaydateError> {
        Ok(self.closes.get(&date).cloned().unwrap_or_default())
    }

    fn coarse_universe(&self, date: NaiveDate) -> Result<Vec<CoarseFundamental>, PaydateError> {
        let mut coarse: Vec<CoarseFundamental> = self
            .closes
            .get(&date)
            .map(|prices| {
                prices
                    .iter()
                    .map(|(symbol, &price)| CoarseFundamental {
                        symbol: symbol.clone(),
                        price,
                    })
                    .collect()
            })
            .unwrap_or_default();
        coarse.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(coarse)
    }

    fn fine_fundamentals(
        &self,
        date: NaiveDate,
        symbols: &[String],
    ) -> Result<Vec<FineFundamental>, PaydateError> {
        Ok(symbols
            .iter()
            .filter_map(|symbol| {
                self.fundamentals
                    .get(symbol)?
                    .range(..=date)
                    .next_back()
                    .map(|(_, fine)| fine.clone())
            })
            .collect())
    }
}
