//! Domain error types.

/// Top-level error type for dipledger.
#[derive(Debug, thiserror::Error)]
pub enum DipledgerError {
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

    #[error("no data for {ticker} on {market}")]
    NoData { ticker: String, market: String },

    #[error("insufficient data for {ticker} on {market}: have {bars} bars, need {minimum}")]
    InsufficientData {
        ticker: String,
        market: String,
        bars: usize,
        minimum: usize,
    },

    #[error("malformed price data in {path}: {reason}")]
    DataParse { path: String, reason: String },

    #[error("ledger {path} is corrupt: {reason}")]
    LedgerCorrupt { path: String, reason: String },

    #[error("refusing to persist ledger: {reason}")]
    LedgerInvariant { reason: String },

    #[error("prompt failed: {reason}")]
    Prompt { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&DipledgerError> for std::process::ExitCode {
    fn from(err: &DipledgerError) -> Self {
        let code: u8 = match err {
            DipledgerError::Io(_) => 1,
            DipledgerError::ConfigParse { .. }
            | DipledgerError::ConfigMissing { .. }
            | DipledgerError::ConfigInvalid { .. } => 2,
            DipledgerError::LedgerCorrupt { .. }
            | DipledgerError::LedgerInvariant { .. } => 3,
            DipledgerError::Prompt { .. } => 4,
            DipledgerError::NoData { .. }
            | DipledgerError::InsufficientData { .. }
            | DipledgerError::DataParse { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
