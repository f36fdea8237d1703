//! Security reference data handed to universe selection.

/// Lightweight per-security data for the coarse selection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CoarseFundamental {
    pub symbol: String,
    pub price: f64,
}

/// Detailed fundamentals for the fine selection pass.
///
/// Trailing twelve-month figures are `None` when the provider has no value.
/// `dividends_per_share` and `dividend_yield` are derived during selection.
#[derive(Debug, Clone, PartialEq)]
pub struct FineFundamental {
    pub symbol: String,
    pub exchange_id: String,
    pub market_cap: f64,
    pub price: f64,
    pub pe_ratio: f64,
    pub basic_eps_ttm: f64,
    pub operating_cash_flow_ttm: Option<f64>,
    pub net_income_ttm: Option<f64>,
    pub dividends_per_share: Option<f64>,
    pub dividend_yield: Option<f64>,
}

impl FineFundamental {
    pub fn new(symbol: &str, exchange_id: &str) -> Self {
        FineFundamental {
            symbol: symbol.to_string(),
            exchange_id: exchange_id.to_string(),
            market_cap: 0.0,
            price: 0.0,
            pe_ratio: 0.0,
            basic_eps_ttm: 0.0,
            operating_cash_flow_ttm: None,
            net_income_ttm: None,
            dividends_per_share: None,
            dividend_yield: None,
        }
    }
}
