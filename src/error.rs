//! Error types for thompson.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TsError {
    /// Neither an arm count nor a prior specification was supplied.
    #[error("missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("label mismatch: expected {expected} labels, got {actual}")]
    LabelMismatch { expected: usize, actual: usize },

    /// A prior moment, reward, or simulation size falls outside its support.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unknown arm: {0}")]
    UnknownArm(String),

    #[error("sampling failed: {0}")]
    Sampling(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TsError {
    /// Stable machine-readable code for robot output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingConfiguration(_) => "missing_configuration",
            Self::LabelMismatch { .. } => "label_mismatch",
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::UnknownArm(_) => "unknown_arm",
            Self::Sampling(_) => "sampling_failed",
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
            Self::Serialization(_) => "serialization_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, TsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_mismatch_message_names_both_counts() {
        let err = TsError::LabelMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "label mismatch: expected 3 labels, got 2");
        assert_eq!(err.code(), "label_mismatch");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TsError = io.into();
        assert_eq!(err.code(), "io_error");
    }
}
