//! Market-on-close fill simulation against a cash-only portfolio.
//!
//! Buys open or add to a long position; sells reduce or close one and record
//! a [`ClosedTrade`]. Shorting is not supported: a sell larger than the held
//! quantity is rejected.

use chrono::NaiveDate;

use super::fee::FeeModel;
use super::portfolio::Portfolio;
use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub date: NaiveDate,
    pub symbol: String,
    /// Signed: positive bought, negative sold.
    pub quantity: i64,
    pub price: f64,
    pub fee: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FillRejection {
    #[error("zero quantity")]
    ZeroQuantity,

    #[error("no closing price")]
    NoPrice,

    #[error("insufficient cash: need {needed:.2}, have {available:.2}")]
    InsufficientCash { needed: f64, available: f64 },

    #[error("sell of {requested} shares exceeds held {held}")]
    ExceedsPosition { held: i64, requested: i64 },
}

/// Largest whole-share quantity whose cost plus fee fits in `cash`.
pub fn affordable_quantity(cash: f64, price: f64, fee_model: Option<&dyn FeeModel>) -> i64 {
    if price <= 0.0 || cash <= 0.0 {
        return 0;
    }
    let fee = |q: i64| fee_model.map(|m| m.order_fee(price, q)).unwrap_or(0.0);
    let mut quantity = (cash / price).floor() as i64;
    while quantity > 0 && quantity as f64 * price + fee(quantity) > cash {
        quantity -= 1;
    }
    quantity
}

/// Buy `quantity` shares at `price`, paying `fee` from cash.
pub fn fill_buy(
    portfolio: &mut Portfolio,
    symbol: &str,
    quantity: i64,
    price: f64,
    fee: f64,
    date: NaiveDate,
) -> Result<Fill, FillRejection> {
    if quantity <= 0 {
        return Err(FillRejection::ZeroQuantity);
    }

    let needed = quantity as f64 * price + fee;
    if needed > portfolio.cash {
        return Err(FillRejection::InsufficientCash {
            needed,
            available: portfolio.cash,
        });
    }

    portfolio.cash -= needed;
    portfolio.total_fees += fee;

    match portfolio.positions.get_mut(symbol) {
        Some(position) => position.increase(quantity, price, fee),
        None => {
            portfolio.positions.insert(
                symbol.to_string(),
                Position {
                    symbol: symbol.to_string(),
                    quantity,
                    entry_price: price,
                    entry_date: date,
                    entry_fees: fee,
                },
            );
        }
    }

    Ok(Fill {
        date,
        symbol: symbol.to_string(),
        quantity,
        price,
        fee,
    })
}

/// Sell `quantity` shares (positive) of an existing long position at `price`.
pub fn fill_sell(
    portfolio: &mut Portfolio,
    symbol: &str,
    quantity: i64,
    price: f64,
    fee: f64,
    date: NaiveDate,
) -> Result<Fill, FillRejection> {
    if quantity <= 0 {
        return Err(FillRejection::ZeroQuantity);
    }

    let held = portfolio.get_position(symbol).map_or(0, |p| p.quantity);
    if quantity > held {
        return Err(FillRejection::ExceedsPosition {
            held,
            requested: quantity,
        });
    }

    let Some(position) = portfolio.positions.get_mut(symbol) else {
        return Err(FillRejection::ExceedsPosition {
            held: 0,
            requested: quantity,
        });
    };

    let share = quantity as f64 / position.quantity as f64;
    let entry_fees = position.entry_fees * share;
    let pnl = quantity as f64 * (price - position.entry_price) - entry_fees - fee;

    let trade = ClosedTrade {
        symbol: symbol.to_string(),
        quantity,
        entry_price: position.entry_price,
        exit_price: price,
        entry_date: position.entry_date,
        exit_date: date,
        fees: entry_fees + fee,
        pnl,
    };

    position.quantity -= quantity;
    position.entry_fees -= entry_fees;
    if position.quantity == 0 {
        portfolio.positions.remove(symbol);
    }

    portfolio.cash += quantity as f64 * price - fee;
    portfolio.total_fees += fee;
    portfolio.record_trade(trade);

    Ok(Fill {
        date,
        symbol: symbol.to_string(),
        quantity: -quantity,
        price,
        fee,
    })
}
