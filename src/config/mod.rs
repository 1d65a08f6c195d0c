//! Configuration management for the demo-mode layer
//!
//! This module handles loading, validating, and providing access to the
//! configuration: where records and the demo flag are stored, what the flag
//! defaults to, how chatty logging is and how often administrators may toggle
//! demo mode. Configuration comes from a TOML file, then `FM_` environment
//! overrides, then validation.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod validation;

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod validation_tests;

#[cfg(test)]
#[path = "tests/config_mod_tests.rs"]
mod config_mod_tests;

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

pub use crate::types::{LogLevel, StorageType};
pub use error::ConfigError;

/// The environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "FM_";

/// The application name used for finding config directories
const APP_NAME: &str = "fixmarket-demo";

/// Top-level configuration.
///
/// # Example
///
/// ```no_run
/// use fixmarket_demo::config::Config;
///
/// // A missing file falls back to defaults (demo mode off, memory storage).
/// let config = Config::load("fixmarket.toml").unwrap();
/// assert!(!config.demo.default_enabled);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Demo mode flag configuration
    #[serde(default)]
    pub demo: DemoConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Throttling of flag updates
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Storage type
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// Base path for file storage (ignored for memory storage)
    pub base_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::Memory,
            base_path: "./data".to_string(),
        }
    }
}

/// Demo mode flag configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoConfig {
    /// Flag value used until an administrator first sets it
    pub default_enabled: bool,
    /// File name of the persisted flag, relative to `storage.base_path`
    pub flag_file: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            default_enabled: false,
            flag_file: "demo_mode.json".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
    /// Whether to log to console
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            console: true,
        }
    }
}

/// Throttling of demo flag updates, per acting administrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Updates allowed per window
    pub max_toggles: u32,
    /// Window length in seconds
    pub window_seconds: u64,
    /// Rejected updates before a temporary ban
    pub violations_before_ban: u32,
    /// Ban length in seconds
    pub ban_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_toggles: 10,
            window_seconds: 60,
            violations_before_ban: 3,
            ban_seconds: 300,
        }
    }
}

impl Config {
    /// Loads the configuration from `path`.
    ///
    /// A missing file is not an error: defaults are used instead. Environment
    /// overrides are applied in both cases, then the result is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, if an
    /// environment override is malformed, or if validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let mut config = match fs::read_to_string(path) {
            Ok(config_str) => toml::from_str::<Config>(&config_str)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Config file not found at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log::error!("Failed to read config file {}: {}", path.display(), e);
                return Err(e.into());
            }
        };

        config.apply_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    ///
    /// Recognised variables: `FM_LOGGING_LEVEL`, `FM_STORAGE_TYPE`,
    /// `FM_STORAGE_BASE_PATH`, `FM_DEMO_DEFAULT_ENABLED`. Empty values are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if any recognised variable cannot be parsed.
    pub fn apply_env_vars(&mut self) -> Result<(), ConfigError> {
        for (key, value) in env::vars() {
            let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            if value.trim().is_empty() {
                continue;
            }

            match stripped.to_lowercase().as_str() {
                "logging_level" => {
                    self.logging.level = value.parse().map_err(|_| {
                        ConfigError::invalid_value("logging.level", &value, "Invalid log level")
                    })?;
                }
                "storage_type" => {
                    self.storage.storage_type = value.parse().map_err(|_| {
                        ConfigError::invalid_value("storage.type", &value, "Expected 'memory' or 'file'")
                    })?;
                }
                "storage_base_path" => {
                    self.storage.base_path = value.clone();
                }
                "demo_default_enabled" => {
                    self.demo.default_enabled = parse_bool(&value).ok_or_else(|| {
                        ConfigError::invalid_value("demo.default_enabled", &value, "Expected a boolean")
                    })?;
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first failing check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_config(self)
    }

    /// Full path of the persisted demo flag.
    pub fn flag_path(&self) -> PathBuf {
        Path::new(&self.storage.base_path).join(&self.demo.flag_file)
    }

    /// Returns the OS-specific directory where configuration files live.
    ///
    /// - Linux: `$HOME/.config/fixmarket-demo`
    /// - macOS: `$HOME/Library/Application Support/com.fixmarket.fixmarket-demo`
    /// - Windows: `%APPDATA%\\fixmarket\\fixmarket-demo`
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "fixmarket", APP_NAME)
            .map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
