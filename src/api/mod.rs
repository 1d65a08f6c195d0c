// src/api/mod.rs

/// Demo-aware record feeds for async callers.
pub mod async_api;
/// Blocking wrapper around the async feed.
pub mod sync_api;

pub use async_api::{DemoFeed, FeedSnapshot, FeedView};
pub use sync_api::BlockingFeed;
