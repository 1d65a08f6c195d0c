//! Configuration validation
//!
//! Checks that values are within acceptable ranges before any backend is
//! built from them.

use std::path::Path;

use super::error::ConfigError;
use super::{Config, DemoConfig, RateLimitConfig, StorageConfig};
use crate::types::StorageType;

/// Validates the whole configuration, section by section.
///
/// # Errors
///
/// Returns a `ConfigError` for the first failing check.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    validate_storage_config(&config.storage)?;
    validate_demo_config(&config.demo)?;
    validate_rate_limit_config(&config.rate_limit)?;
    Ok(())
}

/// Validates the storage configuration.
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.storage_type != StorageType::File {
        return Ok(());
    }

    if config.base_path.trim().is_empty() {
        return Err(ConfigError::invalid_value(
            "storage.base_path",
            "",
            "Base path cannot be empty for file storage",
        ));
    }

    // The directory is created lazily by the file backends; only reject a
    // path that exists and is not a directory.
    let base_path = Path::new(&config.base_path);
    if base_path.exists() && !base_path.is_dir() {
        return Err(ConfigError::invalid_value(
            "storage.base_path",
            base_path.display(),
            "Base path must be a directory",
        ));
    }

    Ok(())
}

/// Validates the demo flag configuration.
fn validate_demo_config(config: &DemoConfig) -> Result<(), ConfigError> {
    let name = config.flag_file.trim();
    if name.is_empty() {
        return Err(ConfigError::invalid_value(
            "demo.flag_file",
            "",
            "Flag file name cannot be empty",
        ));
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(ConfigError::invalid_value(
            "demo.flag_file",
            &config.flag_file,
            "Flag file must be a plain file name inside storage.base_path",
        ));
    }
    Ok(())
}

/// Validates flag update throttling.
fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    let checks: [(&str, u64); 4] = [
        ("rate_limit.max_toggles", config.max_toggles as u64),
        ("rate_limit.window_seconds", config.window_seconds),
        ("rate_limit.violations_before_ban", config.violations_before_ban as u64),
        ("rate_limit.ban_seconds", config.ban_seconds),
    ];
    for (field, value) in checks {
        if value == 0 {
            return Err(ConfigError::invalid_value(field, value, "must be greater than 0"));
        }
    }
    Ok(())
}
