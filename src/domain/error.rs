//! Domain error types.

/// Top-level error type for cryptota.
#[derive(Debug, thiserror::Error)]
pub enum CryptotaError {
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

    #[error("data parse error: {reason}")]
    DataParse { reason: String },

    #[error("missing required column '{column}'")]
    MissingRequiredColumn { column: String },

    #[error("unsupported resample rule '{rule}'")]
    UnsupportedResampleRule { rule: String },

    #[error("timestamps not strictly increasing at bar {index}")]
    UnsortedSeries { index: usize },

    #[error("insufficient history: have {bars} bars, need {minimum}")]
    InsufficientHistory { bars: usize, minimum: usize },

    #[error("non-positive risk per unit: entry {entry}, stop {stop}")]
    InvalidRiskParameter { entry: f64, stop: f64 },

    #[error("broker error: {reason}")]
    Broker { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&CryptotaError> for std::process::ExitCode {
    fn from(err: &CryptotaError) -> Self {
        let code: u8 = match err {
            CryptotaError::Io(_) | CryptotaError::Broker { .. } => 1,
            CryptotaError::ConfigParse { .. }
            | CryptotaError::ConfigMissing { .. }
            | CryptotaError::ConfigInvalid { .. }
            | CryptotaError::UnsupportedResampleRule { .. } => 2,
            CryptotaError::DataParse { .. }
            | CryptotaError::MissingRequiredColumn { .. }
            | CryptotaError::UnsortedSeries { .. } => 3,
            CryptotaError::InvalidRiskParameter { .. } => 4,
            CryptotaError::InsufficientHistory { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let err = CryptotaError::InsufficientHistory {
            bars: 12,
            minimum: 50,
        };
        assert_eq!(err.to_string(), "insufficient history: have 12 bars, need 50");

        let err = CryptotaError::UnsupportedResampleRule {
            rule: "7min".into(),
        };
        assert_eq!(err.to_string(), "unsupported resample rule '7min'");

        let err = CryptotaError::MissingRequiredColumn {
            column: "close".into(),
        };
        assert_eq!(err.to_string(), "missing required column 'close'");
    }

    #[test]
    fn exit_codes_by_class() {
        use std::process::ExitCode;

        let config = CryptotaError::ConfigMissing {
            section: "indicators".into(),
            key: "rsi_period".into(),
        };
        assert_eq!(ExitCode::from(&config), ExitCode::from(2));

        let data = CryptotaError::MissingRequiredColumn {
            column: "open".into(),
        };
        assert_eq!(ExitCode::from(&data), ExitCode::from(3));

        let history = CryptotaError::InsufficientHistory {
            bars: 1,
            minimum: 50,
        };
        assert_eq!(ExitCode::from(&history), ExitCode::from(5));
    }
}
