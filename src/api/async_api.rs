// src/api/async_api.rs

//! The caller side of reconciliation: fetch the live rows and the flag, merge
//! them, and keep the last good view around for when retrieval fails.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::catalog::SyntheticCatalog;
use crate::config::Config;
use crate::core::reconcile::{reconcile_detailed, Reconciliation};
use crate::error::FMError;
use crate::flag::DemoModeFlag;
use crate::storage::{create_record_store, RecordStore, StoredRecord};

/// A reconciled, renderable record set.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedView<T> {
    /// Records to render, live first then synthetic.
    pub records: Vec<T>,
    /// Flag value this view was built with.
    pub demo_enabled: bool,
    /// Synthetic-tagged live rows that were dropped.
    pub quarantined: usize,
    /// When the live rows were last fetched successfully.
    pub refreshed_at: DateTime<Utc>,
}

/// What a refresh hands to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot<T> {
    /// The view to show; `None` only if nothing was ever loaded.
    pub view: Option<FeedView<T>>,
    /// Set when this refresh failed and `view` is the previous one.
    pub error: Option<String>,
}

impl<T> FeedSnapshot<T> {
    /// Whether the refresh failed.
    pub fn is_stale(&self) -> bool {
        self.error.is_some()
    }

    /// Records of the view, empty when nothing was ever loaded.
    pub fn records(&self) -> &[T] {
        self.view.as_ref().map(|v| v.records.as_slice()).unwrap_or(&[])
    }
}

// The retained view and the sequence number of the refresh that built it.
#[derive(Debug)]
struct LastGood<T> {
    seq: u64,
    view: Option<FeedView<T>>,
}

/// A record collection seen through demo mode.
///
/// Refreshes may overlap. Each one takes a sequence number when it starts and
/// only replaces the retained view if no later refresh has published yet, so
/// a slow refresh that read an old flag value cannot undo a newer one.
#[derive(Debug)]
pub struct DemoFeed<T: StoredRecord> {
    name: String,
    records: Arc<dyn RecordStore<T>>,
    flag: DemoModeFlag,
    catalog: &'static [T],
    next_seq: AtomicU64,
    last_good: RwLock<LastGood<T>>,
}

impl<T: StoredRecord + SyntheticCatalog> DemoFeed<T> {
    /// Creates a feed merging `T`'s own synthetic catalog.
    pub fn new(name: impl Into<String>, records: Arc<dyn RecordStore<T>>, flag: DemoModeFlag) -> Self {
        Self::with_catalog(name, records, flag, T::catalog())
    }

    /// Builds the configured record store and flag for `collection`.
    pub async fn from_config(config: &Config, collection: &str) -> Result<Self, FMError> {
        let records = create_record_store::<T>(config, collection).await?;
        let flag = DemoModeFlag::from_config(config).await?;
        Ok(Self::new(collection, records, flag))
    }
}

impl<T: StoredRecord> DemoFeed<T> {
    /// Creates a feed with an explicit catalog.
    pub fn with_catalog(
        name: impl Into<String>,
        records: Arc<dyn RecordStore<T>>,
        flag: DemoModeFlag,
        catalog: &'static [T],
    ) -> Self {
        Self {
            name: name.into(),
            records,
            flag,
            catalog,
            next_seq: AtomicU64::new(1),
            last_good: RwLock::new(LastGood { seq: 0, view: None }),
        }
    }

    /// Feed name, used in log lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The flag this feed reads.
    pub fn flag(&self) -> &DemoModeFlag {
        &self.flag
    }

    /// The last successfully built view.
    pub fn current(&self) -> Option<FeedView<T>> {
        self.last_good.read().view.clone()
    }

    /// Fetches rows and flag concurrently and rebuilds the view.
    pub async fn refresh(&self) -> FeedSnapshot<T> {
        let seq = self.start();
        let (rows, flag) = futures::join!(self.records.fetch_all(), self.flag.get());

        match (rows, flag) {
            (Ok(rows), Ok(enabled)) => self.publish(seq, rows, enabled),
            (Err(e), Ok(false)) => self.fail_with_flag_off(seq, e),
            (Err(e), _) | (_, Err(e)) => self.fail(e),
        }
    }

    /// Rebuilds the view with a flag value the caller already holds.
    pub async fn refresh_with_flag(&self, demo_enabled: bool) -> FeedSnapshot<T> {
        let seq = self.start();
        match self.records.fetch_all().await {
            Ok(rows) => self.publish(seq, rows, demo_enabled),
            Err(e) if !demo_enabled => self.fail_with_flag_off(seq, e),
            Err(e) => self.fail(e),
        }
    }

    fn start(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    fn publish(&self, seq: u64, rows: Vec<T>, demo_enabled: bool) -> FeedSnapshot<T> {
        let Reconciliation {
            records,
            quarantined,
            merged,
        } = reconcile_detailed(rows, self.catalog, demo_enabled);

        if quarantined > 0 {
            log::warn!(
                "feed '{}': dropped {} live row(s) carrying the synthetic tag",
                self.name,
                quarantined
            );
        }
        log::debug!(
            "feed '{}': {} record(s), {} synthetic, demo mode {}",
            self.name,
            records.len(),
            merged,
            if demo_enabled { "on" } else { "off" }
        );

        let view = FeedView {
            records,
            demo_enabled,
            quarantined,
            refreshed_at: Utc::now(),
        };

        let mut last_good = self.last_good.write();
        if last_good.seq > seq {
            log::debug!(
                "feed '{}': refresh #{} superseded by #{}, discarding its view",
                self.name,
                seq,
                last_good.seq
            );
            return FeedSnapshot {
                view: last_good.view.clone(),
                error: None,
            };
        }
        last_good.seq = seq;
        last_good.view = Some(view.clone());
        FeedSnapshot {
            view: Some(view),
            error: None,
        }
    }

    fn fail(&self, error: FMError) -> FeedSnapshot<T> {
        log::error!("feed '{}': refresh failed, keeping previous view: {}", self.name, error);
        FeedSnapshot {
            view: self.current(),
            error: Some(error.to_string()),
        }
    }

    // Rows are unavailable but the flag is known to be off: the retained view
    // must not keep showing synthetic rows, so strip them before serving it.
    // A later refresh that already published wins.
    fn fail_with_flag_off(&self, seq: u64, error: FMError) -> FeedSnapshot<T> {
        log::error!("feed '{}': refresh failed, keeping previous view: {}", self.name, error);

        let mut last_good = self.last_good.write();
        if last_good.seq <= seq {
            if let Some(view) = last_good.view.as_mut() {
                if view.demo_enabled {
                    let live = std::mem::take(&mut view.records);
                    let purged = reconcile_detailed(live, self.catalog, false);
                    view.records = purged.records;
                    view.demo_enabled = false;
                }
            }
            last_good.seq = seq;
        }

        FeedSnapshot {
            view: last_good.view.clone(),
            error: Some(error.to_string()),
        }
    }
}
