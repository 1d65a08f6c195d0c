// src/core/reconcile.rs

//! Merges the synthetic catalog into live data, or keeps it out.
//!
//! The reconciler is a pure function over a snapshot: live rows as the
//! record store returned them, the static catalog, and the demo flag value the
//! caller read. It never fails and never performs I/O.

use crate::core::record::Sourced;

/// Result of a reconciliation pass, with counters for the caller to log.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation<T> {
    /// Visible records: live rows first, then catalog rows.
    pub records: Vec<T>,
    /// Live rows dropped because they carried the synthetic tag.
    pub quarantined: usize,
    /// Catalog rows appended (zero when demo mode is off).
    pub merged: usize,
}

/// Whether a record is synthetic. Only the tag field is consulted.
pub fn is_synthetic<T: Sourced>(record: &T) -> bool {
    record.is_synthetic()
}

/// Drops every synthetic-tagged row from `live`, keeping the order of the rest.
pub fn sanitize<T: Sourced>(live: Vec<T>) -> Vec<T> {
    live.into_iter().filter(|r| !r.is_synthetic()).collect()
}

/// Produces the visible record set for one flag value.
///
/// Synthetic-tagged rows in `live` are always removed, whatever the flag.
/// With `demo_enabled` the catalog is appended in catalog order.
pub fn reconcile<T: Sourced + Clone>(live: Vec<T>, catalog: &[T], demo_enabled: bool) -> Vec<T> {
    reconcile_detailed(live, catalog, demo_enabled).records
}

/// Same as [`reconcile`], also reporting how many rows were quarantined and merged.
pub fn reconcile_detailed<T: Sourced + Clone>(
    live: Vec<T>,
    catalog: &[T],
    demo_enabled: bool,
) -> Reconciliation<T> {
    let received = live.len();
    let mut records = sanitize(live);
    let quarantined = received - records.len();

    let merged = if demo_enabled {
        records.reserve(catalog.len());
        records.extend(catalog.iter().cloned());
        catalog.len()
    } else {
        0
    };

    Reconciliation {
        records,
        quarantined,
        merged,
    }
}
