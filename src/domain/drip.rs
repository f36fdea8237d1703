//! DRIP ticker allow-list.

use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DripTickers {
    tickers: HashSet<String>,
}

impl DripTickers {
    pub fn contains(&self, ticker: &str) -> bool {
        self.tickers.contains(ticker)
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

impl FromIterator<String> for DripTickers {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            tickers: iter.into_iter().collect(),
        }
    }
}

/// Parse the DRIP ticker list: a header line followed by one ticker per line.
pub fn parse_drip_tickers(text: &str) -> DripTickers {
    text.lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_header() {
        let drips = parse_drip_tickers("Symbol\r\nAAPL\r\nKO\r\nT\r\n");
        assert_eq!(drips.len(), 3);
        assert!(drips.contains("AAPL"));
        assert!(drips.contains("KO"));
        assert!(!drips.contains("Symbol"));
    }

    #[test]
    fn ignores_blank_lines_and_whitespace() {
        let drips = parse_drip_tickers("Symbol\n  MMM \n\nXOM\n");
        assert_eq!(drips.len(), 2);
        assert!(drips.contains("MMM"));
    }

    #[test]
    fn header_only() {
        assert!(parse_drip_tickers("Symbol").is_empty());
        assert!(parse_drip_tickers("").is_empty());
    }

    #[test]
    fn duplicates_collapse() {
        let drips = parse_drip_tickers("Symbol\nKO\nKO\n");
        assert_eq!(drips.len(), 1);
    }
}
