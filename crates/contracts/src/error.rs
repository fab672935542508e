//! Layered error definitions
//!
//! Categorized by source: config / precondition / arithmetic / recording

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum AnalysisError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Programmer-input Errors =====
    /// Misuse of an analyzer (non-positive frequency, negative tolerance, ...)
    #[error("precondition violated: {message}")]
    Precondition { message: String },

    /// Multi-stream check invoked with too few streams
    #[error("at least {required} streams required, got {actual}")]
    InsufficientStreams { required: usize, actual: usize },

    // ===== Arithmetic Errors =====
    /// Division by zero over an empty range (empty series, zero buckets, no tables)
    #[error("empty range: {what}")]
    EmptyRange { what: String },

    /// Bucket tables of different widths cannot be merged
    #[error("bucket width mismatch: expected {expected}, got {actual}")]
    BucketWidthMismatch { expected: usize, actual: usize },

    // ===== Recording Errors =====
    /// Recording path does not exist
    #[error("recording not found: {path}")]
    RecordingNotFound { path: String },

    /// Recording content could not be read
    #[error("recording parse error in '{path}' at line {line}: {message}")]
    RecordingParse {
        path: String,
        line: usize,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Create empty range error
    pub fn empty_range(what: impl Into<String>) -> Self {
        Self::EmptyRange { what: what.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalysisError::config_validation("bucket_count", "must be > 0");
        assert_eq!(
            err.to_string(),
            "config validation error at 'bucket_count': must be > 0"
        );

        let err = AnalysisError::InsufficientStreams {
            required: 2,
            actual: 1,
        };
        assert_eq!(err.to_string(), "at least 2 streams required, got 1");
    }
}
