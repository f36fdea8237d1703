//! Reference data read from local copies of the two feeds.

use crate::domain::error::PaydateError;
use crate::ports::reference_data_port::ReferenceDataPort;
use std::fs;
use std::path::{Path, PathBuf};

pub struct FileReferenceAdapter {
    drip_tickers_path: PathBuf,
    dividend_dates_path: PathBuf,
}

impl FileReferenceAdapter {
    pub fn new(drip_tickers_path: PathBuf, dividend_dates_path: PathBuf) -> Self {
        Self {
            drip_tickers_path,
            dividend_dates_path,
        }
    }

    fn read(path: &Path, source_name: &str) -> Result<String, PaydateError> {
        fs::read_to_string(path).map_err(|e| PaydateError::Fetch {
            source_name: source_name.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })
    }
}

impl ReferenceDataPort for FileReferenceAdapter {
    fn fetch_drip_tickers(&self) -> Result<String, PaydateError> {
        Self::read(&self.drip_tickers_path, "drip tickers")
    }

    fn fetch_dividend_dates(&self) -> Result<String, PaydateError> {
        Self::read(&self.dividend_dates_path, "dividend dates")
    }
}
