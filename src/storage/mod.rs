// src/storage/mod.rs

//! Record retrieval backends.
//!
//! A `RecordStore` returns the live rows of one collection, in the order the
//! backend keeps them. Stores know nothing about demo mode: anything they
//! return, including mis-tagged synthetic rows, goes through the reconciler.

pub mod file;
pub mod memory;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::core::Sourced;
use crate::error::FMError;
use crate::types::StorageType;

pub use file::FileRecordStore;
pub use memory::MemoryRecordStore;

/// Bounds every stored record type satisfies.
pub trait StoredRecord:
    Sourced + Clone + Serialize + DeserializeOwned + Debug + Send + Sync + 'static
{
}

impl<T> StoredRecord for T where
    T: Sourced + Clone + Serialize + DeserializeOwned + Debug + Send + Sync + 'static
{
}

/// Read side of a record collection.
#[async_trait]
pub trait RecordStore<T: StoredRecord>: Send + Sync + Debug {
    /// All rows of the collection, in storage order.
    async fn fetch_all(&self) -> Result<Vec<T>, FMError>;
}

/// Builds the record store for `collection` from the configured backend.
///
/// # Errors
///
/// Fails if the file backend cannot prepare its directory or the collection
/// name is not a plain identifier.
pub async fn create_record_store<T: StoredRecord>(
    config: &Config,
    collection: &str,
) -> Result<Arc<dyn RecordStore<T>>, FMError> {
    match config.storage.storage_type {
        StorageType::Memory => {
            log::debug!("using in-memory record store for '{}'", collection);
            Ok(Arc::new(MemoryRecordStore::<T>::new()))
        }
        StorageType::File => {
            log::debug!(
                "using file record store for '{}' under {}",
                collection,
                config.storage.base_path
            );
            let store = FileRecordStore::<T>::new(&config.storage.base_path, collection).await?;
            Ok(Arc::new(store))
        }
    }
}
