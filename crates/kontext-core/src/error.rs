//! Error types for kontext operations.
//!
//! The taxonomy is deliberately small: validation failures are fatal to the
//! call, extraction failures are recovered locally by the pipelines, store
//! failures propagate unless a pipeline explicitly degrades them, and
//! configuration failures are fatal at construction time.

use thiserror::Error;

/// Result type alias for kontext operations.
pub type KontextResult<T> = Result<T, KontextError>;

/// Main error type for all kontext operations.
#[derive(Error, Debug)]
pub enum KontextError {
    /// Input validation failed. Fatal to the call, raised before any store
    /// or model call is made.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// LLM call or LLM-response parsing failed. The add pipeline recovers
    /// from these by degrading to empty extraction lists.
    #[error("Extraction error: {message}")]
    Extraction {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Graph store operation failed.
    #[error("Store error: {message}")]
    Store {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error, fatal at client construction.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (task join failures and other plumbing).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl KontextError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an extraction error.
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
            source: None,
        }
    }

    /// Create an extraction error with a source.
    pub fn extraction_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Extraction {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Create a store error with a source.
    pub fn store_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Store {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True when the error belongs to the locally-recoverable extraction
    /// class.
    pub fn is_extraction(&self) -> bool {
        matches!(self, Self::Extraction { .. })
    }

    /// True when the error is a validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = KontextError::validation("missing group id");
        assert!(err.is_validation());
        assert!(err.to_string().contains("missing group id"));
    }

    #[test]
    fn test_extraction_error_carries_source() {
        let inner = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = KontextError::extraction_with_source("bad model output", inner);
        assert!(err.is_extraction());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_store_error_display() {
        let err = KontextError::store("connection refused");
        assert!(err.to_string().starts_with("Store error"));
    }
}
