//! Error types for the fixmarket demo-mode layer
//!
//! This module defines the error types used throughout the crate. The main
//! error type is `FMError`. Note that the reconciler itself never fails; every
//! variant here belongs to one of its collaborators (record retrieval, flag
//! retrieval/update, configuration).

use thiserror::Error;

/// Main error type for the fixmarket demo-mode layer
#[derive(Error, Debug)]
pub enum FMError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error (JSON): {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),

    /// Record or flag storage operation failed
    #[error("Storage error: {0}")]
    StorageError(String),

    /// The acting user may not perform the operation
    #[error("Operation not allowed: {0}")]
    NotAllowed(String),

    /// The acting user exceeded the permitted rate of flag updates
    #[error("Rate limited: {0}")]
    RateLimited(#[from] crate::rate_limiter::RateLimitError),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unknown or unexpected error
    #[error("An unknown error occurred: {0}")]
    Unknown(String),
}

/// Result type alias for operations that can fail with a [FMError]
pub type Result<T> = std::result::Result<T, FMError>;

impl FMError {
    /// Create a new invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        FMError::InvalidInput(msg.into())
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        FMError::StorageError(msg.into())
    }

    /// Create a new not allowed error
    pub fn not_allowed<S: Into<String>>(what: S) -> Self {
        FMError::NotAllowed(what.into())
    }

    /// Whether this error came from a retrieval collaborator rather than from
    /// the caller's own input.
    pub fn is_retrieval_failure(&self) -> bool {
        matches!(
            self,
            FMError::Io(_) | FMError::SerdeJson(_) | FMError::StorageError(_)
        )
    }
}

impl From<&str> for FMError {
    fn from(s: &str) -> Self {
        FMError::Unknown(s.to_string())
    }
}

impl From<String> for FMError {
    fn from(s: String) -> Self {
        FMError::Unknown(s)
    }
}
