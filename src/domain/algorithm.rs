//! Capability interface between a strategy and the host that drives it.
//!
//! The host owns market data, the portfolio and order execution. It calls
//! [`Algorithm`] hooks sequentially; the algorithm reaches back only through
//! the [`Host`] it is handed.

use chrono::NaiveDate;

use super::fee::FeeModel;
use super::fundamentals::{CoarseFundamental, FineFundamental};
use super::selection::UniverseSelection;

/// Session-relative triggers an algorithm can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledEvent {
    /// Last trading day of each month, just after the open.
    MonthEndAfterOpen,
    /// Every trading day, `minutes` before the close.
    EveryDayBeforeClose { minutes: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holding {
    pub symbol: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKind {
    MarketOnClose,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub symbol: String,
    /// Signed whole shares: positive buys, negative sells.
    pub quantity: i64,
    pub kind: OrderKind,
    pub submitted: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl SecurityChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

pub trait Host {
    fn today(&self) -> NaiveDate;
    fn holdings(&self) -> Vec<Holding>;
    /// Capital available for new orders.
    fn margin_remaining(&self) -> f64;
    fn price(&self, symbol: &str) -> Option<f64>;
    fn market_on_close_order(&mut self, symbol: &str, quantity: i64);
    fn set_fee_model(&mut self, symbol: &str, model: Box<dyn FeeModel>);
}

pub trait Algorithm {
    fn name(&self) -> &str;

    fn schedule(&self) -> Vec<ScheduledEvent>;

    fn coarse_selection(&mut self, coarse: &[CoarseFundamental]) -> UniverseSelection;

    /// Returns the symbols that make up the new universe.
    fn fine_selection(&mut self, fine: Vec<FineFundamental>) -> Vec<String>;

    fn on_securities_changed(&mut self, changes: &SecurityChanges, host: &mut dyn Host);

    fn on_scheduled_event(&mut self, event: ScheduledEvent, host: &mut dyn Host);
}
