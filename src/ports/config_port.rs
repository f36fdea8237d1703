//! Configuration access port trait.

use crate::domain::error::PaydateError;
use chrono::NaiveDate;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;

    /// `YYYY-MM-DD` value, `Ok(None)` when the key is absent.
    fn get_date(&self, section: &str, key: &str) -> Result<Option<NaiveDate>, PaydateError> {
        match self.get_string(section, key) {
            None => Ok(None),
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map(Some)
                .map_err(|_| PaydateError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: format!("invalid date {raw:?} (expected YYYY-MM-DD)"),
                }),
        }
    }
}
