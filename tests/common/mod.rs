#![allow(dead_code)]

use chrono::NaiveDate;
use paydate::domain::backtest::BacktestConfig;
use paydate::domain::error::PaydateError;
use paydate::domain::fundamentals::{CoarseFundamental, FineFundamental};
use paydate::ports::market_data_port::MarketDataPort;
use paydate::ports::reference_data_port::ReferenceDataPort;
use std::collections::{BTreeMap, HashMap};

pub struct MockReferenceData {
    pub drip_tickers: String,
    pub dividend_dates: String,
    pub error: Option<String>,
}

impl MockReferenceData {
    pub fn new(drip_tickers: &str, dividend_dates: &str) -> Self {
        Self {
            drip_tickers: drip_tickers.to_string(),
            dividend_dates: dividend_dates.to_string(),
            error: None,
        }
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }

    fn fetch(&self, source_name: &str, body: &str) -> Result<String, PaydateError> {
        match &self.error {
            Some(reason) => Err(PaydateError::Fetch {
                source_name: source_name.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(body.to_string()),
        }
    }
}

impl ReferenceDataPort for MockReferenceData {
    fn fetch_drip_tickers(&self) -> Result<String, PaydateError> {
        self.fetch("drip tickers", &self.drip_tickers)
    }

    fn fetch_dividend_dates(&self) -> Result<String, PaydateError> {
        self.fetch("dividend dates", &self.dividend_dates)
    }
}

/// Closes per date plus one static fundamentals row per symbol.
#[derive(Default)]
pub struct MockMarketData {
    pub closes: BTreeMap<NaiveDate, HashMap<String, f64>>,
    pub fundamentals: HashMap<String, FineFundamental>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_close(mut self, date: NaiveDate, symbol: &str, close: f64) -> Self {
        self.closes
            .entry(date)
            .or_default()
            .insert(symbol.to_string(), close);
        self
    }

    /// Same close for `symbol` on every date in `dates`.
    pub fn with_flat_closes(mut self, dates: &[NaiveDate], symbol: &str, close: f64) -> Self {
        for &d in dates {
            self = self.with_close(d, symbol, close);
        }
        self
    }

    pub fn with_fundamental(mut self, fine: FineFundamental) -> Self {
        self.fundamentals.insert(fine.symbol.clone(), fine);
        self
    }
}

impl MarketDataPort for MockMarketData {
    fn trading_dates(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, PaydateError> {
        Ok(self
            .closes
            .keys()
            .filter(|d| **d >= start && **d <= end)
            .copied()
            .collect())
    }

    fn closing_prices(&self, date: NaiveDate) -> Result<HashMap<String, f64>, PaydateError> {
        Ok(self.closes.get(&date).cloned().unwrap_or_default())
    }

    fn coarse_universe(&self, date: NaiveDate) -> Result<Vec<CoarseFundamental>, PaydateError> {
        let mut coarse: Vec<CoarseFundamental> = self
            .closes
            .get(&date)
            .into_iter()
            .flatten()
            .map(|(symbol, &price)| CoarseFundamental {
                symbol: symbol.clone(),
                price,
            })
            .collect();
        coarse.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(coarse)
    }

    fn fine_fundamentals(
        &self,
        _date: NaiveDate,
        symbols: &[String],
    ) -> Result<Vec<FineFundamental>, PaydateError> {
        Ok(symbols
            .iter()
            .filter_map(|s| self.fundamentals.get(s).cloned())
            .collect())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A candidate that passes the fine filter. Yield works out to
/// `eps * (1 - ocf / ni) / price`.
pub fn make_fine(symbol: &str, price: f64, eps: f64, ocf: f64, ni: f64) -> FineFundamental {
    FineFundamental {
        market_cap: 1.0e10,
        price,
        pe_ratio: price / eps,
        basic_eps_ttm: eps,
        operating_cash_flow_ttm: Some(ocf),
        net_income_ttm: Some(ni),
        ..FineFundamental::new(symbol, "NYS")
    }
}

pub const DRIP_TICKERS: &str = "Symbol\nKO\nT\nPEP\nXOM\n";

/// Three comment lines, then one line per ex-dividend date.
pub const DIVIDEND_DATES: &str = "\
# dividend dates
# ex_div_date;ticker;payday;record_date;dividend;annualized;announcement
#
2021-03-26;KO;03/30/2021;03/27/2021;0.41;1.64;02/18/2021;
2021-04-01;KO;04/06/2021;04/02/2021;0.42;1.68;03/01/2021;T;04/07/2021;04/02/2021;0.52;2.08;03/01/2021;PEP;04/07/2021;;1.02;4.08;;
2021-04-02;MSFT;04/08/2021;04/03/2021;0.56;2.24;03/15/2021;
";

/// 2021-03-29 .. 2021-04-09, skipping Good Friday.
pub fn scenario_dates() -> Vec<NaiveDate> {
    vec![
        date(2021, 3, 29),
        date(2021, 3, 30),
        date(2021, 3, 31),
        date(2021, 4, 1),
        date(2021, 4, 5),
        date(2021, 4, 6),
        date(2021, 4, 7),
        date(2021, 4, 8),
        date(2021, 4, 9),
    ]
}

/// Ranked by per-security yield: T (4%), KO (2%), XOM (1%), PEP (0.4%).
/// MSFT is not DRIP-eligible.
pub fn scenario_market() -> MockMarketData {
    let dates = scenario_dates();
    MockMarketData::new()
        .with_flat_closes(&dates, "KO", 50.0)
        .with_flat_closes(&dates, "T", 30.0)
        .with_flat_closes(&dates, "PEP", 100.0)
        .with_flat_closes(&dates, "XOM", 40.0)
        .with_flat_closes(&dates, "MSFT", 200.0)
        .with_close(date(2021, 4, 6), "KO", 51.0)
        .with_close(date(2021, 4, 7), "T", 31.0)
        .with_fundamental(make_fine("KO", 50.0, 2.0, 5.0, 10.0))
        .with_fundamental(make_fine("T", 30.0, 3.0, 6.0, 10.0))
        .with_fundamental(make_fine("PEP", 100.0, 4.0, 9.0, 10.0))
        .with_fundamental(make_fine("XOM", 40.0, 2.0, 8.0, 10.0))
        .with_fundamental(make_fine("MSFT", 200.0, 8.0, 1.0, 10.0))
}

pub fn scenario_reference() -> MockReferenceData {
    MockReferenceData::new(DRIP_TICKERS, DIVIDEND_DATES)
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        start_date: date(2021, 3, 29),
        end_date: date(2021, 4, 9),
        initial_capital: 100_000.0,
    }
}
