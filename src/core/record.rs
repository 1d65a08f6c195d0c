// src/core/record.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::RecordSource;

/// Anything that can pass through the reconciler: a stable identifier plus an
/// optional provenance tag. The rest of the record is opaque.
pub trait Sourced {
    /// Identifier, unique across live and synthetic records.
    fn record_id(&self) -> &str;

    /// Provenance tag, `None` when the stored row never had one.
    fn source(&self) -> Option<&RecordSource>;

    /// A missing tag counts as live data.
    fn is_synthetic(&self) -> bool {
        self.source().map_or(false, RecordSource::is_synthetic)
    }
}

/// A generic persisted row with an arbitrary JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    /// stable unique id
    pub id: String,
    /// provenance tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<RecordSource>,
    /// domain fields, untouched by reconciliation
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Record {
    /// Creates a record with the given id, tag and payload.
    pub fn new(
        id: impl Into<String>,
        source: Option<RecordSource>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            source,
            payload,
        }
    }
}

impl Sourced for Record {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> Option<&RecordSource> {
        self.source.as_ref()
    }
}

/// Latitude/longitude pair used by the map views.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    /// degrees north
    pub lat: f64,
    /// degrees east
    pub lng: f64,
}

/// A technician's public listing in the search results and on the map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepairerListing {
    /// listing id
    pub id: String,
    /// shop or technician name
    pub name: String,
    /// city shown on the card
    pub city: String,
    /// postal code used by the search filters
    pub postal_code: String,
    /// map position, if geocoded
    #[serde(default)]
    pub location: Option<GeoPoint>,
    /// device categories handled ("smartphone", "laptop", ...)
    #[serde(default)]
    pub services: Vec<String>,
    /// average review score, 0.0 to 5.0
    #[serde(default)]
    pub rating: Option<f32>,
    /// indicative hourly rate in euro cents
    #[serde(default)]
    pub hourly_rate_cents: Option<u32>,
    /// when the listing was created
    pub created_at: DateTime<Utc>,
    /// provenance tag
    #[serde(default)]
    pub source: Option<RecordSource>,
}

impl Sourced for RepairerListing {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> Option<&RecordSource> {
        self.source.as_ref()
    }
}

/// One day of advertising analytics for a campaign.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdAnalyticsRow {
    /// row id
    pub id: String,
    /// owning campaign
    pub campaign_id: String,
    /// reporting day
    pub day: NaiveDate,
    /// times the ad was shown
    pub impressions: u64,
    /// times the ad was clicked
    pub clicks: u64,
    /// spend for the day in euro cents
    pub spend_cents: u64,
    /// provenance tag
    #[serde(default)]
    pub source: Option<RecordSource>,
}

impl AdAnalyticsRow {
    /// Click-through rate in percent; zero when there were no impressions.
    pub fn click_through_rate(&self) -> f64 {
        if self.impressions == 0 {
            return 0.0;
        }
        self.clicks as f64 * 100.0 / self.impressions as f64
    }
}

impl Sourced for AdAnalyticsRow {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn source(&self) -> Option<&RecordSource> {
        self.source.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_source_deserializes_as_live() {
        let rec: Record = serde_json::from_value(json!({"id": "r9", "payload": {"name": "x"}})).unwrap();
        assert!(rec.source.is_none());
        assert!(!rec.is_synthetic());
    }

    #[test]
    fn ctr_handles_zero_impressions() {
        let row = AdAnalyticsRow {
            id: "a1".into(),
            campaign_id: "c1".into(),
            day: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            impressions: 0,
            clicks: 0,
            spend_cents: 0,
            source: None,
        };
        assert_eq!(row.click_through_rate(), 0.0);

        let row = AdAnalyticsRow { impressions: 200, clicks: 5, ..row };
        assert!((row.click_through_rate() - 2.5).abs() < f64::EPSILON);
    }
}
