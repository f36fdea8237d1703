//! Trading on the dividend payday.
//!
//! Universe: NYSE/AMEX/NASDAQ stocks offering company-sponsored DRIPs,
//! reselected every quarter and narrowed to the higher-yielding half. Each
//! day at the close the strategy sells everything it holds and buys, in equal
//! weights, the universe members whose dividend is paid on the next business
//! day, holding them for one day.

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info};

use super::algorithm::{Algorithm, Host, ScheduledEvent, SecurityChanges};
use super::business_day::next_business_day;
use super::dividend::{DividendCalendar, parse_dividend_calendar};
use super::drip::{DripTickers, parse_drip_tickers};
use super::error::PaydateError;
use super::fee::{DEFAULT_FEE_RATE, LinearFeeModel};
use super::fundamentals::{CoarseFundamental, FineFundamental};
use super::selection::{UniverseSelection, YieldAttribution, coarse_filter, select_top_half};
use crate::ports::reference_data_port::ReferenceDataPort;

pub const STRATEGY_NAME: &str = "Trading on the Dividend Paydate";

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub fee_rate: f64,
    /// Reselect the universe in months divisible by this.
    pub selection_month_multiple: u32,
    pub rebalance_minutes_before_close: u32,
    pub yield_attribution: YieldAttribution,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            fee_rate: DEFAULT_FEE_RATE,
            selection_month_multiple: 3,
            rebalance_minutes_before_close: 16,
            yield_attribution: YieldAttribution::PerSecurity,
        }
    }
}

/// What one rebalance submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebalanceSummary {
    pub liquidated: usize,
    pub entered: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DividendPaydateStrategy {
    params: StrategyParams,
    calendar: DividendCalendar,
    drip_tickers: DripTickers,
    active_universe: Vec<String>,
    selection_flag: bool,
}

impl DividendPaydateStrategy {
    pub fn new(params: StrategyParams, calendar: DividendCalendar, drip_tickers: DripTickers) -> Self {
        DividendPaydateStrategy {
            params,
            calendar,
            drip_tickers,
            active_universe: Vec::new(),
            selection_flag: false,
        }
    }

    /// Fetch and parse both reference feeds, then build the strategy.
    pub fn initialize(
        params: StrategyParams,
        reference: &dyn ReferenceDataPort,
    ) -> Result<Self, PaydateError> {
        let drip_tickers = parse_drip_tickers(&reference.fetch_drip_tickers()?);
        let calendar = parse_dividend_calendar(&reference.fetch_dividend_dates()?)?;

        info!(
            drip_tickers = drip_tickers.len(),
            paydays = calendar.payday_count(),
            records = calendar.record_count(),
            "reference data loaded"
        );

        Ok(Self::new(params, calendar, drip_tickers))
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    pub fn calendar(&self) -> &DividendCalendar {
        &self.calendar
    }

    pub fn active_universe(&self) -> &[String] {
        &self.active_universe
    }

    pub fn selection_flag(&self) -> bool {
        self.selection_flag
    }

    /// Arm the quarterly reselection when the month qualifies.
    pub fn on_month_end(&mut self, date: NaiveDate) {
        if date.month() % self.params.selection_month_multiple == 0 {
            debug!(%date, "universe reselection armed");
            self.selection_flag = true;
        }
    }

    /// Liquidate all holdings, then buy the universe members paid tomorrow.
    pub fn rebalance(&mut self, host: &mut dyn Host) -> RebalanceSummary {
        let mut summary = RebalanceSummary::default();

        for holding in host.holdings() {
            if holding.quantity != 0 {
                host.market_on_close_order(&holding.symbol, -holding.quantity);
                summary.liquidated += 1;
            }
        }

        let today = host.today();
        let day_to_check = next_business_day(today);
        let Some(payers) = self.calendar.paying_on(day_to_check) else {
            return summary;
        };

        let long: Vec<&String> = self
            .active_universe
            .iter()
            .filter(|symbol| payers.contains_key(symbol.as_str()))
            .collect();
        if long.is_empty() {
            debug!(%today, %day_to_check, payers = payers.len(), "no universe member pays next business day");
            return summary;
        }

        let allotment = host.margin_remaining() / long.len() as f64;
        for symbol in long {
            let quantity = match host.price(symbol) {
                Some(price) if price != 0.0 => (allotment / price).floor() as i64,
                _ => 0,
            };
            if quantity == 0 {
                summary.skipped.push(symbol.clone());
                continue;
            }
            host.market_on_close_order(symbol, quantity);
            summary.entered.push(symbol.clone());
        }

        info!(
            %today,
            %day_to_check,
            entered = summary.entered.len(),
            skipped = summary.skipped.len(),
            "payday positions submitted"
        );
        summary
    }
}

impl Algorithm for DividendPaydateStrategy {
    fn name(&self) -> &str {
        STRATEGY_NAME
    }

    fn schedule(&self) -> Vec<ScheduledEvent> {
        vec![
            ScheduledEvent::MonthEndAfterOpen,
            ScheduledEvent::EveryDayBeforeClose {
                minutes: self.params.rebalance_minutes_before_close,
            },
        ]
    }

    fn coarse_selection(&mut self, coarse: &[CoarseFundamental]) -> UniverseSelection {
        if !self.selection_flag {
            return UniverseSelection::Unchanged;
        }
        self.selection_flag = false;

        let selected = coarse_filter(coarse, &self.drip_tickers);
        info!(
            candidates = coarse.len(),
            selected = selected.len(),
            "coarse selection"
        );
        UniverseSelection::Selected(selected)
    }

    fn fine_selection(&mut self, fine: Vec<FineFundamental>) -> Vec<String> {
        let candidates = fine.len();
        self.active_universe = select_top_half(fine, self.params.yield_attribution);
        info!(
            candidates,
            universe = self.active_universe.len(),
            "fine selection"
        );
        self.active_universe.clone()
    }

    fn on_securities_changed(&mut self, changes: &SecurityChanges, host: &mut dyn Host) {
        for symbol in &changes.added {
            host.set_fee_model(
                symbol,
                Box::new(LinearFeeModel {
                    rate: self.params.fee_rate,
                }),
            );
        }
    }

    fn on_scheduled_event(&mut self, event: ScheduledEvent, host: &mut dyn Host) {
        match event {
            ScheduledEvent::MonthEndAfterOpen => self.on_month_end(host.today()),
            ScheduledEvent::EveryDayBeforeClose { .. } => {
                self.rebalance(host);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::algorithm::Holding;
    use crate::domain::dividend::DividendInfo;
    use crate::domain::fee::FeeModel;
    use std::collections::HashMap;

    #[derive(Debug, Default)]
    struct RecordingHost {
        today: Option<NaiveDate>,
        holdings: Vec<Holding>,
        margin: f64,
        prices: HashMap<String, f64>,
        orders: Vec<(String, i64)>,
        fee_models: HashMap<String, Box<dyn FeeModel>>,
    }

    impl Host for RecordingHost {
        fn today(&self) -> NaiveDate {
            self.today.unwrap()
        }
        fn holdings(&self) -> Vec<Holding> {
            self.holdings.clone()
        }
        fn margin_remaining(&self) -> f64 {
            self.margin
        }
        fn price(&self, symbol: &str) -> Option<f64> {
            self.prices.get(symbol).copied()
        }
        fn market_on_close_order(&mut self, symbol: &str, quantity: i64) {
            self.orders.push((symbol.to_string(), quantity));
        }
        fn set_fee_model(&mut self, symbol: &str, model: Box<dyn FeeModel>) {
            self.fee_models.insert(symbol.to_string(), model);
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn paying(ticker: &str, payday: NaiveDate) -> DividendInfo {
        DividendInfo {
            ticker: ticker.into(),
            ex_div_date: payday - chrono::Duration::days(7),
            payday: Some(payday),
            record_date: None,
            dividend_value: Some(0.5),
            ann_dividend_value: Some(2.0),
            announcement_date: None,
        }
    }

    fn strategy_with(calendar: DividendCalendar, universe: &[&str]) -> DividendPaydateStrategy {
        let drips = ["KO", "T", "XOM"].iter().map(|s| s.to_string()).collect();
        let mut s = DividendPaydateStrategy::new(StrategyParams::default(), calendar, drips);
        s.active_universe = universe.iter().map(|s| s.to_string()).collect();
        s
    }

    #[test]
    fn month_end_arms_only_in_quarter_end_months() {
        let mut s = strategy_with(DividendCalendar::new(), &[]);
        for month in [1, 2, 4, 5, 7, 8, 10, 11] {
            s.on_month_end(date(2021, month, 28));
            assert!(!s.selection_flag(), "month {month}");
        }
        for month in [3, 6, 9, 12] {
            s.selection_flag = false;
            s.on_month_end(date(2021, month, 28));
            assert!(s.selection_flag(), "month {month}");
        }
    }

    #[test]
    fn coarse_selection_is_one_shot() {
        let mut s = strategy_with(DividendCalendar::new(), &[]);
        let coarse = vec![
            CoarseFundamental { symbol: "KO".into(), price: 50.0 },
            CoarseFundamental { symbol: "TSLA".into(), price: 700.0 },
        ];

        assert_eq!(s.coarse_selection(&coarse), UniverseSelection::Unchanged);

        s.on_month_end(date(2021, 3, 31));
        assert_eq!(
            s.coarse_selection(&coarse),
            UniverseSelection::Selected(vec!["KO".to_string()])
        );
        assert!(!s.selection_flag());
        assert_eq!(s.coarse_selection(&coarse), UniverseSelection::Unchanged);
    }

    #[test]
    fn fine_selection_replaces_universe() {
        let mut s = strategy_with(DividendCalendar::new(), &["OLD"]);
        let fine: Vec<FineFundamental> = ["KO", "T"]
            .iter()
            .enumerate()
            .map(|(i, sym)| FineFundamental {
                market_cap: 1.0e9,
                price: 10.0,
                pe_ratio: 10.0,
                basic_eps_ttm: 1.0 + i as f64,
                operating_cash_flow_ttm: Some(0.0),
                net_income_ttm: Some(1.0),
                ..FineFundamental::new(sym, "NYS")
            })
            .collect();
        assert_eq!(s.fine_selection(fine), vec!["T".to_string()]);
        assert_eq!(s.active_universe(), &["T".to_string()]);
    }

    #[test]
    fn rebalance_liquidates_and_buys_next_day_payers() {
        let mut calendar = DividendCalendar::new();
        // Thursday 2021-01-14 -> Friday 2021-01-15
        calendar.insert(paying("KO", date(2021, 1, 15)));
        calendar.insert(paying("T", date(2021, 1, 15)));
        calendar.insert(paying("MSFT", date(2021, 1, 15)));
        let mut s = strategy_with(calendar, &["KO", "T", "XOM"]);

        let mut host = RecordingHost {
            today: Some(date(2021, 1, 14)),
            holdings: vec![Holding { symbol: "XOM".into(), quantity: 30 }],
            margin: 10_000.0,
            prices: HashMap::from([("KO".into(), 50.0), ("T".into(), 30.0)]),
            ..Default::default()
        };

        let summary = s.rebalance(&mut host);

        assert_eq!(summary.liquidated, 1);
        assert_eq!(summary.entered, vec!["KO", "T"]);
        assert_eq!(
            host.orders,
            vec![
                ("XOM".to_string(), -30),
                ("KO".to_string(), 100),
                ("T".to_string(), 166),
            ]
        );
    }

    #[test]
    fn rebalance_on_friday_checks_monday() {
        let mut calendar = DividendCalendar::new();
        calendar.insert(paying("KO", date(2021, 1, 16)));
        calendar.insert(paying("T", date(2021, 1, 18)));
        let mut s = strategy_with(calendar, &["KO", "T"]);

        let mut host = RecordingHost {
            today: Some(date(2021, 1, 15)),
            margin: 1_000.0,
            prices: HashMap::from([("KO".into(), 50.0), ("T".into(), 10.0)]),
            ..Default::default()
        };

        let summary = s.rebalance(&mut host);
        assert_eq!(summary.entered, vec!["T"]);
        assert_eq!(host.orders, vec![("T".to_string(), 100)]);
    }

    #[test]
    fn empty_universe_only_liquidates() {
        let mut calendar = DividendCalendar::new();
        calendar.insert(paying("KO", date(2021, 1, 15)));
        let mut s = strategy_with(calendar, &[]);

        let mut host = RecordingHost {
            today: Some(date(2021, 1, 14)),
            holdings: vec![
                Holding { symbol: "KO".into(), quantity: 10 },
                Holding { symbol: "T".into(), quantity: 0 },
            ],
            margin: 1_000.0,
            prices: HashMap::from([("KO".into(), 50.0)]),
            ..Default::default()
        };

        let summary = s.rebalance(&mut host);
        assert_eq!(summary.liquidated, 1);
        assert!(summary.entered.is_empty());
        assert_eq!(host.orders, vec![("KO".to_string(), -10)]);
    }

    #[test]
    fn zero_or_missing_price_is_skipped() {
        let mut calendar = DividendCalendar::new();
        calendar.insert(paying("KO", date(2021, 1, 15)));
        calendar.insert(paying("T", date(2021, 1, 15)));
        calendar.insert(paying("XOM", date(2021, 1, 15)));
        let mut s = strategy_with(calendar, &["KO", "T", "XOM"]);

        let mut host = RecordingHost {
            today: Some(date(2021, 1, 14)),
            margin: 3_000.0,
            prices: HashMap::from([("KO".into(), 0.0), ("T".into(), 10.0)]),
            ..Default::default()
        };

        let summary = s.rebalance(&mut host);
        assert_eq!(summary.entered, vec!["T"]);
        assert_eq!(summary.skipped, vec!["KO", "XOM"]);
        // allotment still divided across all three
        assert_eq!(host.orders, vec![("T".to_string(), 100)]);
    }

    #[test]
    fn no_payday_bucket_is_noop() {
        let mut s = strategy_with(DividendCalendar::new(), &["KO"]);
        let mut host = RecordingHost {
            today: Some(date(2021, 1, 14)),
            margin: 3_000.0,
            ..Default::default()
        };
        assert_eq!(s.rebalance(&mut host), RebalanceSummary::default());
        assert!(host.orders.is_empty());
    }

    #[test]
    fn added_securities_get_linear_fee_model() {
        let mut s = strategy_with(DividendCalendar::new(), &[]);
        let mut host = RecordingHost::default();
        let changes = SecurityChanges {
            added: vec!["KO".into()],
            removed: vec!["T".into()],
        };
        s.on_securities_changed(&changes, &mut host);

        let model = host.fee_models.get("KO").unwrap();
        assert!((model.order_fee(100.0, -200) - 1.0).abs() < 1e-12);
        assert!(!host.fee_models.contains_key("T"));
    }

    #[test]
    fn schedule_uses_configured_minutes() {
        let s = strategy_with(DividendCalendar::new(), &[]);
        assert_eq!(
            s.schedule(),
            vec![
                ScheduledEvent::MonthEndAfterOpen,
                ScheduledEvent::EveryDayBeforeClose { minutes: 16 },
            ]
        );
    }
}
