//! Domain error types.

/// Top-level error type for paydate.
#[derive(Debug, thiserror::Error)]
pub enum PaydateError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("failed to fetch {source_name}: {reason}")]
    Fetch { source_name: String, reason: String },

    #[error("dividend calendar line {line}: {reason}")]
    DividendParse { line: usize, reason: String },

    #[error("market data error: {reason}")]
    MarketData { reason: String },

    #[error("no market data between {start} and {end}")]
    NoData { start: String, end: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&PaydateError> for std::process::ExitCode {
    fn from(err: &PaydateError) -> Self {
        let code: u8 = match err {
            PaydateError::Io(_) => 1,
            PaydateError::ConfigParse { .. }
            | PaydateError::ConfigMissing { .. }
            | PaydateError::ConfigInvalid { .. } => 2,
            PaydateError::Fetch { .. } | PaydateError::MarketData { .. } => 3,
            PaydateError::DividendParse { .. } => 4,
            PaydateError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
