// src/storage/memory.rs

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::error::FMError;
use crate::storage::{RecordStore, StoredRecord};

/// An in-memory record collection, primarily for tests and local previews.
///
/// Rows keep their insertion order. Clones share the same rows. A failure can
/// be armed with [`set_fail_on_fetch`](Self::set_fail_on_fetch) to exercise the
/// callers' error paths.
#[derive(Debug, Clone)]
pub struct MemoryRecordStore<T> {
    rows: Arc<RwLock<Vec<T>>>,
    fail_on_fetch: Arc<Mutex<Option<String>>>,
}

impl<T: StoredRecord> MemoryRecordStore<T> {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::with_rows(Vec::new())
    }

    /// Creates a store holding `rows`.
    pub fn with_rows(rows: Vec<T>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows)),
            fail_on_fetch: Arc::new(Mutex::new(None)),
        }
    }

    /// Inserts a row, replacing in place any row with the same id.
    pub fn insert(&self, row: T) {
        let mut rows = self.rows.write();
        match rows.iter().position(|r| r.record_id() == row.record_id()) {
            Some(idx) => rows[idx] = row,
            None => rows.push(row),
        }
    }

    /// Replaces the whole collection.
    pub fn replace_all(&self, rows: Vec<T>) {
        *self.rows.write() = rows;
    }

    /// Removes the row with `id`, returning it.
    pub fn remove(&self, id: &str) -> Option<T> {
        let mut rows = self.rows.write();
        let idx = rows.iter().position(|r| r.record_id() == id)?;
        Some(rows.remove(idx))
    }

    /// Removes all rows.
    pub fn clear(&self) {
        self.rows.write().clear();
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// Checks if the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    /// Makes every subsequent `fetch_all` fail with `reason`.
    pub fn set_fail_on_fetch(&self, reason: impl Into<String>) {
        *self.fail_on_fetch.lock() = Some(reason.into());
    }

    /// Clears any previously set failure.
    pub fn clear_fail_on_fetch(&self) {
        *self.fail_on_fetch.lock() = None;
    }
}

impl<T: StoredRecord> Default for MemoryRecordStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: StoredRecord> RecordStore<T> for MemoryRecordStore<T> {
    async fn fetch_all(&self) -> Result<Vec<T>, FMError> {
        if let Some(reason) = self.fail_on_fetch.lock().as_ref() {
            return Err(FMError::StorageError(format!(
                "Simulated MemoryRecordStore fetch failure: {}",
                reason
            )));
        }
        Ok(self.rows.read().clone())
    }
}
