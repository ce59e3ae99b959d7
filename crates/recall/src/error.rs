//! Error types for Recall

use thiserror::Error;

use crate::oracle::OracleError;

/// Main error type for Recall operations
#[derive(Error, Debug)]
pub enum RecallError {
    /// Oracle failures (protocol, transport, timeout). Always fatal for a run.
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Memory persistence errors (read/write/rename of the store document)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RecallError {
    /// Whether this error came from the oracle rather than local state
    pub fn is_oracle(&self) -> bool {
        matches!(self, RecallError::Oracle(_))
    }
}

/// Result type alias for Recall operations
pub type Result<T> = std::result::Result<T, RecallError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_oracle_error_converts() {
        let err: RecallError = OracleError::Timeout(Duration::from_secs(5)).into();
        assert!(err.is_oracle());
        assert_eq!(err.to_string(), "Oracle error: Oracle timed out after 5s");
    }

    #[test]
    fn test_storage_error_display() {
        let err = RecallError::Storage("disk full".to_string());
        assert!(!err.is_oracle());
        assert_eq!(err.to_string(), "Storage error: disk full");
    }
}
