// src/api/sync_api.rs

use tokio::runtime::Runtime;

use crate::api::async_api::{DemoFeed, FeedSnapshot, FeedView};
use crate::catalog::SyntheticCatalog;
use crate::config::Config;
use crate::error::{FMError, Result as FMResult};
use crate::flag::{Actor, FlagState};
use crate::storage::StoredRecord;

/// Blocking access to a [`DemoFeed`] for callers without an async runtime.
///
/// Owns a Tokio runtime; do not use from inside another runtime.
#[derive(Debug)]
pub struct BlockingFeed<T: StoredRecord> {
    feed: DemoFeed<T>,
    rt: Runtime,
}

impl<T: StoredRecord + SyntheticCatalog> BlockingFeed<T> {
    /// Builds the configured store and flag for `collection`.
    pub fn from_config(config: &Config, collection: &str) -> FMResult<Self> {
        let rt = new_runtime()?;
        let feed = rt.block_on(DemoFeed::from_config(config, collection))?;
        Ok(Self { feed, rt })
    }
}

impl<T: StoredRecord> BlockingFeed<T> {
    /// Wraps an existing feed.
    pub fn new(feed: DemoFeed<T>) -> FMResult<Self> {
        Ok(Self {
            feed,
            rt: new_runtime()?,
        })
    }

    /// See [`DemoFeed::refresh`].
    pub fn refresh(&self) -> FeedSnapshot<T> {
        self.rt.block_on(self.feed.refresh())
    }

    /// See [`DemoFeed::refresh_with_flag`].
    pub fn refresh_with_flag(&self, demo_enabled: bool) -> FeedSnapshot<T> {
        self.rt.block_on(self.feed.refresh_with_flag(demo_enabled))
    }

    /// The last successfully built view.
    pub fn current(&self) -> Option<FeedView<T>> {
        self.feed.current()
    }

    /// Current flag value.
    pub fn demo_enabled(&self) -> FMResult<bool> {
        self.rt.block_on(self.feed.flag().get())
    }

    /// Sets the flag; administrators only.
    pub fn set_demo_mode(&self, actor: &Actor, enabled: bool) -> FMResult<FlagState> {
        self.rt.block_on(self.feed.flag().set(actor, enabled))
    }

    /// The wrapped async feed.
    pub fn inner(&self) -> &DemoFeed<T> {
        &self.feed
    }
}

fn new_runtime() -> FMResult<Runtime> {
    Runtime::new().map_err(|e| FMError::Unknown(format!("Failed to create Tokio runtime: {}", e)))
}
