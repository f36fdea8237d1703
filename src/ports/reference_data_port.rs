//! Reference data port: the DRIP ticker list and the dividend dates feed.

use crate::domain::error::PaydateError;

pub trait ReferenceDataPort {
    /// Raw DRIP ticker list (header line, then one ticker per line).
    fn fetch_drip_tickers(&self) -> Result<String, PaydateError>;

    /// Raw semicolon-delimited dividend dates feed.
    fn fetch_dividend_dates(&self) -> Result<String, PaydateError>;
}
