//! Two-stage universe selection: DRIP allow-list (coarse), then fundamentals
//! filter and dividend-yield ranking (fine).

use std::str::FromStr;

use super::drip::DripTickers;
use super::fundamentals::{CoarseFundamental, FineFundamental};

/// NYSE, NASDAQ and AMEX exchange identifiers.
pub const LISTED_EXCHANGES: [&str; 3] = ["NYS", "NAS", "ASE"];

#[derive(Debug, Clone, PartialEq)]
pub enum UniverseSelection {
    /// Keep the current universe.
    Unchanged,
    Selected(Vec<String>),
}

/// Which fine candidates get dividends-per-share and yield assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YieldAttribution {
    /// Every candidate gets its own figures.
    #[default]
    PerSecurity,
    /// Only the last filtered candidate is assigned, using its own payout
    /// ratio; the rest keep whatever the provider supplied. Matches the
    /// historical backtests of this strategy.
    LastCandidateOnly,
}

impl FromStr for YieldAttribution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "per_security" => Ok(YieldAttribution::PerSecurity),
            "last_candidate_only" => Ok(YieldAttribution::LastCandidateOnly),
            other => Err(format!(
                "unknown yield attribution {other:?} (expected per_security or last_candidate_only)"
            )),
        }
    }
}

/// Symbols from the coarse list whose ticker is DRIP-eligible, in input order.
pub fn coarse_filter(coarse: &[CoarseFundamental], drips: &DripTickers) -> Vec<String> {
    coarse
        .iter()
        .filter(|c| drips.contains(&c.symbol))
        .map(|c| c.symbol.clone())
        .collect()
}

pub fn passes_fine_filter(f: &FineFundamental) -> bool {
    f.market_cap != 0.0
        && LISTED_EXCHANGES.contains(&f.exchange_id.as_str())
        && f.price > 0.0
        && f.pe_ratio > 0.0
        && f.basic_eps_ttm > 0.0
        && f.operating_cash_flow_ttm.is_some()
        && matches!(f.net_income_ttm, Some(ni) if ni != 0.0)
}

/// 1 - operating cash flow / net income.
pub fn payout_ratio(operating_cash_flow: f64, net_income: f64) -> f64 {
    1.0 - operating_cash_flow / net_income
}

fn assign_yield(f: &mut FineFundamental, payout: f64) {
    let dps = f.basic_eps_ttm * payout;
    f.dividends_per_share = Some(dps);
    f.dividend_yield = Some(dps / f.price);
}

/// Derive dividends-per-share and yield on filtered candidates.
pub fn attribute_yields(fine: &mut [FineFundamental], attribution: YieldAttribution) {
    let payout = |f: &FineFundamental| {
        payout_ratio(
            f.operating_cash_flow_ttm.unwrap_or(0.0),
            f.net_income_ttm.unwrap_or(1.0),
        )
    };

    match attribution {
        YieldAttribution::PerSecurity => {
            for f in fine.iter_mut() {
                let p = payout(f);
                assign_yield(f, p);
            }
        }
        YieldAttribution::LastCandidateOnly => {
            if let Some(last) = fine.last_mut() {
                let p = payout(last);
                assign_yield(last, p);
            }
        }
    }
}

/// DPS / price, or 0 when the price is not positive or DPS is unknown.
pub fn ranking_yield(f: &FineFundamental) -> f64 {
    match f.dividends_per_share {
        Some(dps) if f.price > 0.0 => dps / f.price,
        _ => 0.0,
    }
}

/// Stable sort, highest ranking yield first.
pub fn rank_by_yield(fine: &mut [FineFundamental]) {
    fine.sort_by(|a, b| ranking_yield(b).total_cmp(&ranking_yield(a)));
}

/// Filter, derive yields, rank and keep the top half (floor of n / 2).
pub fn select_top_half(
    fine: Vec<FineFundamental>,
    attribution: YieldAttribution,
) -> Vec<String> {
    let mut candidates: Vec<FineFundamental> =
        fine.into_iter().filter(passes_fine_filter).collect();

    attribute_yields(&mut candidates, attribution);
    rank_by_yield(&mut candidates);

    let half = candidates.len() / 2;
    candidates
        .into_iter()
        .take(half)
        .map(|f| f.symbol)
        .collect()
}
