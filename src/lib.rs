// src/lib.rs

//! Demo/production data-mode reconciliation for the repair marketplace.
//!
//! Listing and analytics views can showcase a fixed catalog of synthetic
//! records. Whether they do is a single deployment-wide flag. The
//! [`reconcile`] function decides what a view shows; the rest of the crate
//! provides its collaborators: record stores, the flag with its audit trail and
//! throttling, and feeds that tie them together.

pub mod api;
pub mod catalog;
pub mod config;
pub mod core;
pub mod error;
pub mod flag;
pub mod rate_limiter;
pub mod storage;
pub mod types;

#[doc(hidden)]
pub mod test_utils;

pub use crate::catalog::SyntheticCatalog;
pub use crate::config::Config;
pub use crate::core::{is_synthetic, reconcile, reconcile_detailed, sanitize, Record, Sourced};
pub use crate::error::{FMError, Result as FMResult};
pub use crate::types::{LogLevel, RecordSource, StorageType, SYNTHETIC_SOURCE_TAG};

/// Loads the configuration and installs the logger.
///
/// `config_path` defaults to `fixmarket.toml` in the working directory; a
/// missing file means defaults.
///
/// # Errors
///
/// Fails if the configuration is invalid or a logger is already installed.
pub fn init(config_path: Option<&str>) -> FMResult<Config> {
    let config = Config::load(config_path.unwrap_or("fixmarket.toml"))?;

    #[cfg(feature = "logging")]
    if config.logging.console {
        env_logger::Builder::new()
            .filter_level(config.logging.level.to_level_filter())
            .parse_default_env()
            .try_init()
            .map_err(|e| FMError::invalid_input(format!("Logger already initialized: {}", e)))?;
    }

    log::info!(
        "fixmarket-demo initialised: storage={}, demo default={}",
        config.storage.storage_type,
        config.demo.default_enabled
    );
    Ok(config)
}
