//! Error types for configuration handling
//!
//! The main error type is `ConfigError`, raised while loading, parsing and
//! validating the configuration.

use std::io;
use thiserror::Error;

/// Errors that can occur during configuration loading, parsing, and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error occurred while reading the configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The configuration file is not valid TOML or does not match the schema.
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Invalid configuration value.
    #[error("Invalid value for '{field}': '{value}'. {reason}")]
    InvalidValue {
        /// The name of the field that has an invalid value.
        field: String,
        /// The invalid value.
        value: String,
        /// The reason the value is invalid.
        reason: String,
    },
}

impl ConfigError {
    /// Creates a new invalid value error.
    pub fn invalid_value<S1, S2, S3>(field: S1, value: S2, reason: S3) -> Self
    where
        S1: Into<String>,
        S2: std::fmt::Display,
        S3: Into<String>,
    {
        ConfigError::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}
