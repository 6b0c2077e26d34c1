//! Error types for the slow query analyzer
//!
//! Only the collector, the config loader and the report writer can fail.
//! Detection and suggestion generation never return these errors.

use thiserror::Error;

/// Errors raised by the I/O facing parts of the analyzer
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to connect to StarRocks: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Invalid query record {query_id}: {reason}")]
    InvalidRecord { query_id: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Report generation failed: {0}")]
    Report(String),
}

impl AnalyzerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    pub fn invalid_record(query_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRecord { query_id: query_id.into(), reason: reason.into() }
    }
}

/// Result type alias for analyzer operations
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_record_message() {
        let err = AnalyzerError::invalid_record("q-1", "end_time before start_time");
        assert_eq!(err.to_string(), "Invalid query record q-1: end_time before start_time");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AnalyzerError = io.into();
        assert!(matches!(err, AnalyzerError::Io(_)));
    }
}
