//! Market data port used by the replay host.

use crate::domain::error::PaydateError;
use crate::domain::fundamentals::{CoarseFundamental, FineFundamental};
use chrono::NaiveDate;
use std::collections::HashMap;

pub trait MarketDataPort {
    /// Trading dates within `[start, end]`, ascending.
    fn trading_dates(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, PaydateError>;

    fn closing_prices(&self, date: NaiveDate) -> Result<HashMap<String, f64>, PaydateError>;

    /// Every security trading on `date`.
    fn coarse_universe(&self, date: NaiveDate) -> Result<Vec<CoarseFundamental>, PaydateError>;

    /// Latest known fundamentals on or before `date` for `symbols`.
    /// Symbols without fundamentals are omitted.
    fn fine_fundamentals(
        &self,
        date: NaiveDate,
        symbols: &[String],
    ) -> Result<Vec<FineFundamental>, PaydateError>;
}
