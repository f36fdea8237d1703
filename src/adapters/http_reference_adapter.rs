//! Reference data fetched over HTTP(S) with a blocking client.

use crate::domain::error::PaydateError;
use crate::ports::reference_data_port::ReferenceDataPort;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_DRIP_TICKERS_URL: &str =
    "https://data.quantpedia.com/backtesting_data/economic/drip_tickers.csv";
pub const DEFAULT_DIVIDEND_DATES_URL: &str =
    "https://data.quantpedia.com/backtesting_data/economic/dividend_dates.csv";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpReferenceAdapter {
    client: reqwest::blocking::Client,
    drip_tickers_url: String,
    dividend_dates_url: String,
}

impl HttpReferenceAdapter {
    pub fn new(drip_tickers_url: &str, dividend_dates_url: &str) -> Result<Self, PaydateError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PaydateError::Fetch {
                source_name: "http client".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            drip_tickers_url: normalize_url(drip_tickers_url),
            dividend_dates_url: normalize_url(dividend_dates_url),
        })
    }

    fn get(&self, url: &str, source_name: &str) -> Result<String, PaydateError> {
        let fetch_error = |reason: String| PaydateError::Fetch {
            source_name: source_name.to_string(),
            reason,
        };

        info!(%url, "fetching {source_name}");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {status} from {url}")));
        }

        response.text().map_err(|e| fetch_error(e.to_string()))
    }
}

impl ReferenceDataPort for HttpReferenceAdapter {
    fn fetch_drip_tickers(&self) -> Result<String, PaydateError> {
        self.get(&self.drip_tickers_url, "drip tickers")
    }

    fn fetch_dividend_dates(&self) -> Result<String, PaydateError> {
        self.get(&self.dividend_dates_url, "dividend dates")
    }
}

/// Prefix scheme-less URLs with `https://`.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}
