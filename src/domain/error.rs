//! Domain error types.

/// Top-level error type for smacross.
#[derive(Debug, thiserror::Error)]
pub enum SmacrossError {
    #[error("insufficient history: window {window} needs at least {window} observations, have {observations}")]
    InsufficientHistory { window: usize, observations: usize },

    #[error("price series has {prices} values but moving average has {averages}")]
    LengthMismatch { prices: usize, averages: usize },

    #[error("no closed trade for {instrument}")]
    NoSignal { instrument: String },

    #[error("degenerate arithmetic: {reason}")]
    DegenerateArithmetic { reason: String },

    #[error("invalid security id {id:?}: {reason}")]
    InvalidSecurityId { id: String, reason: String },

    #[error("market data API error: {message}")]
    Api { message: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("data format error: {reason}")]
    DataFormat { reason: String },

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

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SmacrossError {
    /// Errors that concern a single instrument and must not stop a batch.
    pub fn is_per_instrument(&self) -> bool {
        matches!(
            self,
            SmacrossError::InsufficientHistory { .. }
                | SmacrossError::LengthMismatch { .. }
                | SmacrossError::NoSignal { .. }
                | SmacrossError::DegenerateArithmetic { .. }
                | SmacrossError::InvalidSecurityId { .. }
                | SmacrossError::Api { .. }
                | SmacrossError::Http(_)
                | SmacrossError::DataFormat { .. }
        )
    }
}

impl From<&SmacrossError> for std::process::ExitCode {
    fn from(err: &SmacrossError) -> Self {
        let code: u8 = match err {
            SmacrossError::Io(_) => 1,
            SmacrossError::ConfigParse { .. }
            | SmacrossError::ConfigMissing { .. }
            | SmacrossError::ConfigInvalid { .. }
            | SmacrossError::InvalidSecurityId { .. } => 2,
            SmacrossError::Api { .. } | SmacrossError::Http(_) | SmacrossError::DataFormat { .. } => 3,
            SmacrossError::InsufficientHistory { .. }
            | SmacrossError::LengthMismatch { .. }
            | SmacrossError::NoSignal { .. }
            | SmacrossError::DegenerateArithmetic { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
