//! Replay host and event loop.
//!
//! Replays the trading dates of a [`MarketDataPort`] and drives an
//! [`Algorithm`] through them. Per date:
//!
//! 1. universe selection before the open (coarse, then fine on `Selected`),
//!    followed by `on_securities_changed` when subscriptions moved;
//! 2. scheduled events in the order the algorithm lists them
//!    (`MonthEndAfterOpen` only on the last trading date of a month);
//! 3. market-on-close fills at that date's close, sells before buys;
//! 4. equity marked at the close.
//!
//! Accounting is cash-only: buying power is cash plus the proceeds of
//! pending market-on-close sells. There is no margin, slippage or partial
//! fill model.

use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

use super::algorithm::{Algorithm, Holding, Host, Order, OrderKind, ScheduledEvent, SecurityChanges};
use super::error::PaydateError;
use super::execution::{Fill, FillRejection, affordable_quantity, fill_buy, fill_sell};
use super::fee::FeeModel;
use super::portfolio::Portfolio;
use super::selection::UniverseSelection;
use crate::ports::market_data_port::MarketDataPort;

pub const DEFAULT_START_DATE: (i32, u32, u32) = (2012, 9, 18);
pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedOrder {
    pub order: Order,
    pub reason: FillRejection,
}

#[derive(Debug)]
pub struct BacktestResult {
    pub portfolio: Portfolio,
    pub fills: Vec<Fill>,
    pub rejected: Vec<RejectedOrder>,
    pub trading_days: usize,
    pub universe_changes: usize,
}

pub struct ReplayHost<'a> {
    market: &'a dyn MarketDataPort,
    portfolio: Portfolio,
    today: NaiveDate,
    prices: HashMap<String, f64>,
    last_prices: HashMap<String, f64>,
    pending: Vec<Order>,
    fee_models: HashMap<String, Box<dyn FeeModel>>,
    subscriptions: BTreeSet<String>,
    fills: Vec<Fill>,
    rejected: Vec<RejectedOrder>,
    universe_changes: usize,
}

impl<'a> ReplayHost<'a> {
    pub fn new(market: &'a dyn MarketDataPort, config: &BacktestConfig) -> Self {
        ReplayHost {
            market,
            portfolio: Portfolio::new(config.initial_capital),
            today: config.start_date,
            prices: HashMap::new(),
            last_prices: HashMap::new(),
            pending: Vec::new(),
            fee_models: HashMap::new(),
            subscriptions: BTreeSet::new(),
            fills: Vec::new(),
            rejected: Vec::new(),
            universe_changes: 0,
        }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn subscriptions(&self) -> &BTreeSet<String> {
        &self.subscriptions
    }

    /// Replay `[start, end]` and consume the host into a result.
    pub fn run(
        mut self,
        algorithm: &mut dyn Algorithm,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BacktestResult, PaydateError> {
        let dates = self.market.trading_dates(start, end)?;
        if dates.is_empty() {
            return Err(PaydateError::NoData {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let month_ends = month_ends(&dates);
        let schedule = algorithm.schedule();

        info!(
            algorithm = algorithm.name(),
            days = dates.len(),
            %start,
            %end,
            "replay started"
        );

        for &date in &dates {
            self.today = date;
            self.prices = self.market.closing_prices(date)?;
            self.last_prices
                .extend(self.prices.iter().map(|(k, v)| (k.clone(), *v)));

            self.select_universe(algorithm)?;

            for &event in &schedule {
                let due = match event {
                    ScheduledEvent::MonthEndAfterOpen => month_ends.contains(&date),
                    ScheduledEvent::EveryDayBeforeClose { .. } => true,
                };
                if due {
                    algorithm.on_scheduled_event(event, &mut self);
                }
            }

            self.fill_pending();

            let equity = self.portfolio.total_equity(&self.last_prices);
            self.portfolio.record_equity(date, equity);
            debug!(%date, equity, positions = self.portfolio.position_count(), "close");
        }

        info!(
            fills = self.fills.len(),
            rejected = self.rejected.len(),
            trades = self.portfolio.closed_trades.len(),
            "replay finished"
        );

        Ok(BacktestResult {
            portfolio: self.portfolio,
            fills: self.fills,
            rejected: self.rejected,
            trading_days: dates.len(),
            universe_changes: self.universe_changes,
        })
    }

    fn select_universe(&mut self, algorithm: &mut dyn Algorithm) -> Result<(), PaydateError> {
        let coarse = self.market.coarse_universe(self.today)?;
        let UniverseSelection::Selected(symbols) = algorithm.coarse_selection(&coarse) else {
            return Ok(());
        };

        let fine = self.market.fine_fundamentals(self.today, &symbols)?;
        let selected: BTreeSet<String> = algorithm.fine_selection(fine).into_iter().collect();

        let changes = SecurityChanges {
            added: selected.difference(&self.subscriptions).cloned().collect(),
            removed: self.subscriptions.difference(&selected).cloned().collect(),
        };
        self.subscriptions = selected;

        if !changes.is_empty() {
            self.universe_changes += 1;
            info!(
                date = %self.today,
                added = changes.added.len(),
                removed = changes.removed.len(),
                "universe changed"
            );
            algorithm.on_securities_changed(&changes, self);
        }
        Ok(())
    }

    fn fee(&self, symbol: &str, price: f64, quantity: i64) -> f64 {
        self.fee_models
            .get(symbol)
            .map(|m| m.order_fee(price, quantity))
            .unwrap_or(0.0)
    }

    fn fill_pending(&mut self) {
        let mut orders = std::mem::take(&mut self.pending);
        // stable: sells keep submission order, then buys
        orders.sort_by_key(|o| o.quantity > 0);

        for order in orders {
            let Some(&price) = self.prices.get(&order.symbol) else {
                self.reject(order, FillRejection::NoPrice);
                continue;
            };

            let result = if order.quantity < 0 {
                let fee = self.fee(&order.symbol, price, order.quantity);
                fill_sell(&mut self.portfolio, &order.symbol, -order.quantity, price, fee, self.today)
            } else {
                let model = self.fee_models.get(&order.symbol).map(|m| m.as_ref());
                let mut quantity = order.quantity;
                let cost = quantity as f64 * price + self.fee(&order.symbol, price, quantity);
                if cost > self.portfolio.cash {
                    quantity = affordable_quantity(self.portfolio.cash, price, model);
                    debug!(
                        symbol = %order.symbol,
                        requested = order.quantity,
                        quantity,
                        "buy reduced to available cash"
                    );
                }
                let fee = self.fee(&order.symbol, price, quantity);
                fill_buy(&mut self.portfolio, &order.symbol, quantity, price, fee, self.today)
            };

            match result {
                Ok(fill) => self.fills.push(fill),
                Err(reason) => self.reject(order, reason),
            }
        }
    }

    fn reject(&mut self, order: Order, reason: FillRejection) {
        warn!(
            date = %self.today,
            symbol = %order.symbol,
            quantity = order.quantity,
            %reason,
            "order rejected"
        );
        self.rejected.push(RejectedOrder { order, reason });
    }
}

impl Host for ReplayHost<'_> {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn holdings(&self) -> Vec<Holding> {
        let mut holdings: Vec<Holding> = self
            .portfolio
            .positions
            .values()
            .map(|p| Holding {
                symbol: p.symbol.clone(),
                quantity: p.quantity,
            })
            .collect();
        holdings.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        holdings
    }

    fn margin_remaining(&self) -> f64 {
        let pending: f64 = self
            .pending
            .iter()
            .map(|o| {
                let price = self.prices.get(&o.symbol).copied().unwrap_or(0.0);
                -(o.quantity as f64) * price
            })
            .sum();
        self.portfolio.cash + pending
    }

    fn price(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).copied()
    }

    fn market_on_close_order(&mut self, symbol: &str, quantity: i64) {
        self.pending.push(Order {
            symbol: symbol.to_string(),
            quantity,
            kind: OrderKind::MarketOnClose,
            submitted: self.today,
        });
    }

    fn set_fee_model(&mut self, symbol: &str, model: Box<dyn FeeModel>) {
        self.fee_models.insert(symbol.to_string(), model);
    }
}

/// Last trading date of each calendar month present in `dates`.
pub fn month_ends(dates: &[NaiveDate]) -> HashSet<NaiveDate> {
    let mut last: HashMap<(i32, u32), NaiveDate> = HashMap::new();
    for &date in dates {
        let entry = last.entry((date.year(), date.month())).or_insert(date);
        if date > *entry {
            *entry = date;
        }
    }
    last.into_values().collect()
}
