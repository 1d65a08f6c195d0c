//! Static synthetic catalogs.
//!
//! Each record family has exactly one catalog, built once on first use and
//! shared read-only afterwards. Every entry carries the `demo` tag and an id in
//! the `demo-` namespace, which live stores never issue.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use lazy_static::lazy_static;

use crate::core::{AdAnalyticsRow, GeoPoint, Record, RepairerListing};
use crate::types::RecordSource;

/// Prefix reserved for synthetic record ids.
pub const SYNTHETIC_ID_PREFIX: &str = "demo-";

/// Record families that ship a synthetic showcase catalog.
pub trait SyntheticCatalog: Sized + 'static {
    /// The catalog, in display order.
    fn catalog() -> &'static [Self];
}

lazy_static! {
    static ref DEMO_REPAIRERS: Vec<RepairerListing> = build_repairers();
    static ref DEMO_AD_ANALYTICS: Vec<AdAnalyticsRow> = build_ad_analytics();
}

impl SyntheticCatalog for RepairerListing {
    fn catalog() -> &'static [Self] {
        DEMO_REPAIRERS.as_slice()
    }
}

impl SyntheticCatalog for AdAnalyticsRow {
    fn catalog() -> &'static [Self] {
        DEMO_AD_ANALYTICS.as_slice()
    }
}

impl SyntheticCatalog for Record {
    fn catalog() -> &'static [Self] {
        &[]
    }
}

#[allow(clippy::too_many_arguments)]
fn repairer(
    n: u32,
    name: &str,
    city: &str,
    postal_code: &str,
    (lat, lng): (f64, f64),
    services: &[&str],
    rating: f32,
    hourly_rate_cents: u32,
) -> RepairerListing {
    RepairerListing {
        id: format!("{}repairer-{}", SYNTHETIC_ID_PREFIX, n),
        name: name.to_string(),
        city: city.to_string(),
        postal_code: postal_code.to_string(),
        location: Some(GeoPoint { lat, lng }),
        services: services.iter().map(|s| s.to_string()).collect(),
        rating: Some(rating),
        hourly_rate_cents: Some(hourly_rate_cents),
        // Fixed timestamp so the catalog is identical on every build.
        created_at: Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).single().unwrap_or(DateTime::<Utc>::MIN_UTC),
        source: Some(RecordSource::Demo),
    }
}

fn build_repairers() -> Vec<RepairerListing> {
    vec![
        repairer(1, "Atelier Réparation Express", "Paris", "75011", (48.8589, 2.3795), &["smartphone", "tablet"], 4.8, 4500),
        repairer(2, "Lyon Micro Services", "Lyon", "69003", (45.7597, 4.8590), &["laptop", "desktop"], 4.5, 5500),
        repairer(3, "Marseille Phone Clinic", "Marseille", "13006", (43.2887, 5.3810), &["smartphone", "console"], 4.2, 4000),
        repairer(4, "Toulouse Tech Repair", "Toulouse", "31000", (43.6045, 1.4440), &["laptop", "smartphone", "tablet"], 4.9, 6000),
        repairer(5, "Bordeaux Console Lab", "Bordeaux", "33000", (44.8378, -0.5792), &["console"], 4.1, 3500),
        repairer(6, "Nantes Écrans & Co", "Nantes", "44000", (47.2184, -1.5536), &["smartphone", "tv"], 4.6, 5000),
    ]
}

fn build_ad_analytics() -> Vec<AdAnalyticsRow> {
    let rows: [(&str, u32, u64, u64, u64); 6] = [
        ("spring-promo", 1, 1_200, 36, 1_500),
        ("spring-promo", 2, 1_450, 51, 1_500),
        ("spring-promo", 3, 980, 22, 1_500),
        ("local-boost", 1, 640, 30, 900),
        ("local-boost", 2, 720, 41, 900),
        ("local-boost", 3, 810, 38, 900),
    ];

    rows.iter()
        .enumerate()
        .map(|(i, &(campaign, day, impressions, clicks, spend_cents))| AdAnalyticsRow {
            id: format!("{}ad-{}", SYNTHETIC_ID_PREFIX, i + 1),
            campaign_id: format!("{}{}", SYNTHETIC_ID_PREFIX, campaign),
            day: NaiveDate::from_ymd_opt(2024, 3, day).unwrap_or(NaiveDate::MIN),
            impressions,
            clicks,
            spend_cents,
            source: Some(RecordSource::Demo),
        })
        .collect()
}
