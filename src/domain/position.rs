//! Open positions and closed round trips.

use chrono::NaiveDate;

/// A long holding in one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub quantity: i64,
    /// Volume-weighted average fill price.
    pub entry_price: f64,
    pub entry_date: NaiveDate,
    /// Fees paid on the fills still open in this position.
    pub entry_fees: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity as f64 * (price - self.entry_price)
    }

    /// Add shares at `price`, re-averaging the entry price.
    pub fn increase(&mut self, quantity: i64, price: f64, fee: f64) {
        let total = self.quantity + quantity;
        self.entry_price =
            (self.entry_price * self.quantity as f64 + price * quantity as f64) / total as f64;
        self.quantity = total;
        self.entry_fees += fee;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub symbol: String,
    pub quantity: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub fees: f64,
    /// Price PnL net of entry and exit fees.
    pub pnl: f64,
}

impl ClosedTrade {
    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_position() -> Position {
        Position {
            symbol: "KO".into(),
            quantity: 100,
            entry_price: 50.0,
            entry_date: NaiveDate::from_ymd_opt(2021, 1, 14).unwrap(),
            entry_fees: 0.25,
        }
    }

    #[test]
    fn market_value() {
        assert!((sample_position().market_value(55.0) - 5500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unrealized_pnl() {
        let pos = sample_position();
        assert!((pos.unrealized_pnl(55.0) - 500.0).abs() < f64::EPSILON);
        assert!((pos.unrealized_pnl(45.0) + 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn increase_averages_entry_price() {
        let mut pos = sample_position();
        pos.increase(100, 60.0, 0.3);
        assert_eq!(pos.quantity, 200);
        assert!((pos.entry_price - 55.0).abs() < 1e-12);
        assert!((pos.entry_fees - 0.55).abs() < 1e-12);
    }

    #[test]
    fn holding_days() {
        let trade = ClosedTrade {
            symbol: "KO".into(),
            quantity: 100,
            entry_price: 50.0,
            exit_price: 51.0,
            entry_date: NaiveDate::from_ymd_opt(2021, 1, 15).unwrap(),
            exit_date: NaiveDate::from_ymd_opt(2021, 1, 18).unwrap(),
            fees: 0.5,
            pnl: 99.5,
        };
        assert_eq!(trade.holding_days(), 3);
    }
}
