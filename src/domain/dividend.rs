//! Dividend calendar: per-payday dividend records parsed from the
//! semicolon-delimited dividend dates feed.
//!
//! Feed layout: three comment lines, then one line per ex-dividend date:
//!
//! ```text
//! 2021-01-08;AAPL;01/15/2021;01/10/2021;0.50;2.00;12/01/2020;MSFT;...
//! ```
//!
//! Every line after the leading date carries repeating six-field groups
//! (ticker, payday, record date, dividend, annualized dividend, announcement
//! date). Any group field may be empty.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use super::error::PaydateError;

pub const COMMENT_LINES: usize = 3;
pub const FIELDS_PER_GROUP: usize = 6;

const EX_DIV_DATE_FORMAT: &str = "%Y-%m-%d";
const GROUP_DATE_FORMAT: &str = "%m/%d/%Y";

#[derive(Debug, Clone, PartialEq)]
pub struct DividendInfo {
    pub ticker: String,
    pub ex_div_date: NaiveDate,
    pub payday: Option<NaiveDate>,
    pub record_date: Option<NaiveDate>,
    pub dividend_value: Option<f64>,
    pub ann_dividend_value: Option<f64>,
    pub announcement_date: Option<NaiveDate>,
}

/// Dividend records keyed by payday, then ticker.
///
/// Records without a payday are kept under the `None` bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DividendCalendar {
    by_payday: HashMap<Option<NaiveDate>, BTreeMap<String, DividendInfo>>,
}

impl DividendCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any earlier record for the same payday and ticker.
    pub fn insert(&mut self, info: DividendInfo) {
        self.by_payday
            .entry(info.payday)
            .or_default()
            .insert(info.ticker.clone(), info);
    }

    /// Records whose payday is `date`.
    pub fn paying_on(&self, date: NaiveDate) -> Option<&BTreeMap<String, DividendInfo>> {
        self.by_payday.get(&Some(date))
    }

    pub fn undated(&self) -> Option<&BTreeMap<String, DividendInfo>> {
        self.by_payday.get(&None)
    }

    pub fn get(&self, payday: Option<NaiveDate>, ticker: &str) -> Option<&DividendInfo> {
        self.by_payday.get(&payday)?.get(ticker)
    }

    pub fn payday_count(&self) -> usize {
        self.by_payday.len()
    }

    pub fn record_count(&self) -> usize {
        self.by_payday.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_payday.is_empty()
    }
}

/// Parse the dividend dates feed into a calendar.
///
/// Short trailing groups, bad dates and bad numbers are rejected with the
/// 1-based line number. A group made only of empty fields (a trailing `;`)
/// is ignored.
pub fn parse_dividend_calendar(text: &str) -> Result<DividendCalendar, PaydateError> {
    let body = skip_lines(text, COMMENT_LINES);

    let mut calendar = DividendCalendar::new();

    for (idx, raw) in body.lines().enumerate() {
        let line = idx + 1 + COMMENT_LINES;
        let fields: Vec<&str> = raw.split(';').map(str::trim).collect();
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }

        let ex_div_date = NaiveDate::parse_from_str(fields[0], EX_DIV_DATE_FORMAT).map_err(|e| {
            PaydateError::DividendParse {
                line,
                reason: format!("invalid ex-dividend date {:?}: {}", fields[0], e),
            }
        })?;

        for group in fields[1..].chunks(FIELDS_PER_GROUP) {
            if group.iter().all(|f| f.is_empty()) {
                continue;
            }
            if group.len() < FIELDS_PER_GROUP {
                return Err(PaydateError::DividendParse {
                    line,
                    reason: format!(
                        "short field group for {:?}: {} of {} fields",
                        group[0],
                        group.len(),
                        FIELDS_PER_GROUP
                    ),
                });
            }

            calendar.insert(DividendInfo {
                ticker: group[0].to_string(),
                ex_div_date,
                payday: parse_optional_date(group[1], line)?,
                record_date: parse_optional_date(group[2], line)?,
                dividend_value: parse_optional_value(group[3], line)?,
                ann_dividend_value: parse_optional_value(group[4], line)?,
                announcement_date: parse_optional_date(group[5], line)?,
            });
        }
    }

    Ok(calendar)
}

fn skip_lines(text: &str, n: usize) -> &str {
    let mut rest = text;
    for _ in 0..n {
        match rest.find('\n') {
            Some(idx) => rest = &rest[idx + 1..],
            None => return "",
        }
    }
    rest
}

fn parse_optional_date(field: &str, line: usize) -> Result<Option<NaiveDate>, PaydateError> {
    if field.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(field, GROUP_DATE_FORMAT)
        .map(Some)
        .map_err(|e| PaydateError::DividendParse {
            line,
            reason: format!("invalid date {:?}: {}", field, e),
        })
}

fn parse_optional_value(field: &str, line: usize) -> Result<Option<f64>, PaydateError> {
    if field.is_empty() {
        return Ok(None);
    }
    field
        .parse::<f64>()
        .map(Some)
        .map_err(|e| PaydateError::DividendParse {
            line,
            reason: format!("invalid value {:?}: {}", field, e),
        })
}
