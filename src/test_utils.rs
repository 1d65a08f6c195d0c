// src/test_utils.rs

//! Fixtures shared by unit tests, integration tests and benchmarks.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;

use crate::config::Config;
use crate::core::{Record, RepairerListing};
use crate::flag::{DemoModeFlag, MemoryAuditSink, MemoryFlagBackend};
use crate::rate_limiter::{RateLimitSettings, RateLimiter};
use crate::types::{RecordSource, StorageType};

/// In-memory configuration with demo mode off.
pub fn get_test_config() -> Config {
    let mut config = Config::default();
    config.storage.storage_type = StorageType::Memory;
    config.storage.base_path = String::new();
    config
}

/// A generic record with an optional source tag.
pub fn record(id: &str, source: Option<&str>) -> Record {
    Record::new(id, source.map(RecordSource::from), json!({ "name": id }))
}

/// A live-looking repairer listing with an optional source tag.
pub fn listing(id: &str, source: Option<&str>) -> RepairerListing {
    RepairerListing {
        id: id.to_string(),
        name: format!("Repairer {}", id),
        city: "Lille".to_string(),
        postal_code: "59000".to_string(),
        location: None,
        services: vec!["smartphone".to_string()],
        rating: None,
        hourly_rate_cents: None,
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        source: source.map(RecordSource::from),
    }
}

/// A flag over `backend` auditing into `audit`, with default throttling.
pub fn test_flag(backend: &MemoryFlagBackend, audit: &MemoryAuditSink) -> DemoModeFlag {
    DemoModeFlag::new(
        Arc::new(backend.clone()),
        Arc::new(audit.clone()),
        RateLimiter::new(RateLimitSettings::default()),
    )
}
