//! Order fee models.

pub const DEFAULT_FEE_RATE: f64 = 0.00005;

/// Fee charged for filling `quantity` shares at `price`, in account currency.
pub trait FeeModel: std::fmt::Debug {
    fn order_fee(&self, price: f64, quantity: i64) -> f64;
}

/// price * |quantity| * rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFeeModel {
    pub rate: f64,
}

impl Default for LinearFeeModel {
    fn default() -> Self {
        LinearFeeModel {
            rate: DEFAULT_FEE_RATE,
        }
    }
}

impl FeeModel for LinearFeeModel {
    fn order_fee(&self, price: f64, quantity: i64) -> f64 {
        price * quantity.unsigned_abs() as f64 * self.rate
    }
}
