//! Error types for tasar
//!
//! Every fallible operation in the crate returns [`Result`]. The variants
//! distinguish the three failure domains the server cares about: artifact
//! loading (fatal at startup), schema resolution (client-shaped, surfaced
//! as 422), and model invocation (surfaced as 500).

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, TasarError>;

/// Errors produced while loading artifacts or serving predictions
#[derive(Debug, Error)]
pub enum TasarError {
    /// File or socket I/O failed
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the failed operation
        message: String,
    },

    /// Artifact bytes do not conform to the `.tsr` format
    #[error("format error: {reason}")]
    FormatError {
        /// What was malformed
        reason: String,
    },

    /// A row does not satisfy the model's column schema
    #[error("schema error: {reason}")]
    SchemaError {
        /// Which column or value failed to resolve
        reason: String,
    },

    /// A categorical value is absent from the artifact's vocabulary
    #[error("unknown category {value:?} for column {column:?}")]
    UnknownCategory {
        /// Column the value was supplied for
        column: String,
        /// The out-of-vocabulary value
        value: String,
    },

    /// Model invocation failed
    #[error("inference error: {reason}")]
    InferenceError {
        /// Description from the predictor
        reason: String,
    },

    /// Bad server or CLI configuration
    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        /// What was rejected
        message: String,
    },
}

impl TasarError {
    /// True when the error was caused by the request payload rather than
    /// the server or the artifact. Client-shaped errors map to 422.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TasarError::SchemaError { .. } | TasarError::UnknownCategory { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = TasarError::IoError {
            message: "open failed".to_string(),
        };
        assert_eq!(err.to_string(), "I/O error: open failed");
    }

    #[test]
    fn test_format_error_display() {
        let err = TasarError::FormatError {
            reason: "bad magic".to_string(),
        };
        assert_eq!(err.to_string(), "format error: bad magic");
    }

    #[test]
    fn test_unknown_category_display() {
        let err = TasarError::UnknownCategory {
            column: "region".to_string(),
            value: "atlantis".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unknown category \"atlantis\" for column \"region\""
        );
    }

    #[test]
    fn test_client_error_classification() {
        let schema = TasarError::SchemaError {
            reason: "missing column".to_string(),
        };
        let vocab = TasarError::UnknownCategory {
            column: "smoker".to_string(),
            value: "maybe".to_string(),
        };
        let io = TasarError::IoError {
            message: "disk".to_string(),
        };
        assert!(schema.is_client_error());
        assert!(vocab.is_client_error());
        assert!(!io.is_client_error());
    }
}
