// src/storage/file.rs

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uuid::Uuid;

use crate::error::FMError;
use crate::storage::{RecordStore, StoredRecord};

const MARKER_FILE_NAME: &str = ".fixmarket-demo";
const RECORDS_SUBDIR: &str = "records";

/// A record collection persisted as one JSON array on disk.
///
/// Layout: `base_path/records/<collection>.json`. A collection that was never
/// written reads as empty.
#[derive(Debug)]
pub struct FileRecordStore<T> {
    base_path: PathBuf,
    collection: String,
    _marker: PhantomData<fn() -> T>,
}

fn valid_collection_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl<T: StoredRecord> FileRecordStore<T> {
    /// Creates a store for `collection` under `base_path`.
    ///
    /// Creates the base directory and a marker file if they don't exist yet.
    pub async fn new<P: AsRef<Path>>(base_path: P, collection: &str) -> Result<Self, FMError> {
        if !valid_collection_name(collection) {
            return Err(FMError::invalid_input(format!(
                "Collection name '{}' must be non-empty and contain only [A-Za-z0-9_-]",
                collection
            )));
        }

        let path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(path.join(RECORDS_SUBDIR)).await.map_err(|e| {
            FMError::StorageError(format!("Failed to create base path '{}': {}", path.display(), e))
        })?;

        let marker_path = path.join(MARKER_FILE_NAME);
        if !fs::try_exists(&marker_path).await.map_err(|e| {
            FMError::StorageError(format!(
                "Failed to check marker file existence '{}': {}",
                marker_path.display(),
                e
            ))
        })? {
            fs::File::create(&marker_path).await.map_err(|e| {
                FMError::StorageError(format!(
                    "Failed to create marker file '{}': {}",
                    marker_path.display(),
                    e
                ))
            })?;
        }

        Ok(Self {
            base_path: path,
            collection: collection.to_string(),
            _marker: PhantomData,
        })
    }

    /// Path of the collection file.
    pub fn collection_path(&self) -> PathBuf {
        self.base_path
            .join(RECORDS_SUBDIR)
            .join(format!("{}.json", self.collection))
    }

    /// Overwrites the collection with `rows`.
    ///
    /// A concurrent reader sees either the old or the new collection.
    pub async fn save_all(&self, rows: &[T]) -> Result<(), FMError> {
        let json = serde_json::to_string_pretty(rows)?;
        replace_file(&self.collection_path(), json).await
    }

    /// Inserts one row, replacing in place any row with the same id.
    ///
    /// This reads the collection, edits it and writes it back without any
    /// locking: with several concurrent writers one insert can overwrite
    /// another. Serialize inserts to a collection if more than one writer
    /// exists.
    pub async fn insert(&self, row: T) -> Result<(), FMError> {
        let mut rows = self.fetch_all().await?;
        match rows.iter().position(|r| r.record_id() == row.record_id()) {
            Some(idx) => rows[idx] = row,
            None => rows.push(row),
        }
        self.save_all(&rows).await
    }
}

/// Replaces `path` with `contents` through a uniquely named sibling temp file
/// and a rename, so readers never see a half-written file and concurrent
/// writers never share a temp file.
pub(crate) async fn replace_file(path: &Path, contents: String) -> Result<(), FMError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));

    fs::write(&tmp_path, contents).await.map_err(|e| {
        FMError::StorageError(format!("Failed to write '{}': {}", tmp_path.display(), e))
    })?;
    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(FMError::StorageError(format!(
            "Failed to replace '{}': {}",
            path.display(),
            e
        )));
    }
    Ok(())
}

#[async_trait]
impl<T: StoredRecord> RecordStore<T> for FileRecordStore<T> {
    async fn fetch_all(&self) -> Result<Vec<T>, FMError> {
        let path = self.collection_path();
        let data = match fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(FMError::StorageError(format!(
                    "Failed to read collection '{}': {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&data).map_err(|e| {
            FMError::StorageError(format!(
                "Collection '{}' is not a valid JSON array of records: {}",
                path.display(),
                e
            ))
        })
    }
}
