// src/core/mod.rs

/// Record model: the `Sourced` trait and the record families fed to the reconciler.
pub mod record;
/// The demo/live reconciliation pass.
pub mod reconcile;

pub use record::{AdAnalyticsRow, GeoPoint, Record, RepairerListing, Sourced};
pub use reconcile::{is_synthetic, reconcile, reconcile_detailed, sanitize, Reconciliation};
