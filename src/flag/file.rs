// src/flag/file.rs

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{FlagBackend, FlagState};
use crate::error::FMError;
use crate::storage::file::replace_file;

/// Flag persisted as a small JSON document.
///
/// Until the first `store`, the file does not exist and `load` returns the
/// initial state given at construction.
#[derive(Debug)]
pub struct FileFlagBackend {
    path: PathBuf,
    initial: FlagState,
}

impl FileFlagBackend {
    /// Creates a backend at `path`, creating its parent directory.
    pub async fn new<P: AsRef<Path>>(path: P, initial: FlagState) -> Result<Self, FMError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    FMError::StorageError(format!(
                        "Failed to create flag directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        Ok(Self { path, initial })
    }

    /// Location of the flag document.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FlagBackend for FileFlagBackend {
    async fn load(&self) -> Result<FlagState, FMError> {
        match fs::read_to_string(&self.path).await {
            Ok(data) => serde_json::from_str(&data).map_err(|e| {
                FMError::StorageError(format!(
                    "Flag file '{}' is corrupt: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(self.initial.clone()),
            Err(e) => Err(FMError::StorageError(format!(
                "Failed to read flag file '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn store(&self, state: &FlagState) -> Result<(), FMError> {
        let json = serde_json::to_string_pretty(state)?;
        replace_file(&self.path, json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_reads_initial_state() {
        let dir = tempdir().unwrap();
        let backend = FileFlagBackend::new(dir.path().join("flag.json"), FlagState::initial(false))
            .await
            .unwrap();
        assert_eq!(backend.load().await.unwrap(), FlagState::initial(false));
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("flag.json");
        let backend = FileFlagBackend::new(&path, FlagState::default()).await.unwrap();

        let state = FlagState {
            enabled: true,
            updated_at: Some(chrono::Utc::now()),
            updated_by: Some("admin-1".into()),
        };
        backend.store(&state).await.unwrap();
        assert!(path.exists());

        // A fresh backend on the same file sees the persisted value
        let reopened = FileFlagBackend::new(&path, FlagState::default()).await.unwrap();
        assert_eq!(reopened.load().await.unwrap(), state);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flag.json");
        std::fs::write(&path, "true").unwrap();
        let backend = FileFlagBackend::new(&path, FlagState::default()).await.unwrap();
        assert!(backend.load().await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_stores_do_not_collide() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flag.json");
        let backend = FileFlagBackend::new(&path, FlagState::default()).await.unwrap();

        let states: Vec<FlagState> = (0..8)
            .map(|n| FlagState {
                enabled: n % 2 == 0,
                updated_at: None,
                updated_by: Some(format!("admin-{}", n)),
            })
            .collect();
        let results = futures::future::join_all(states.iter().map(|s| backend.store(s))).await;
        assert!(results.iter().all(|r| r.is_ok()));

        assert!(states.contains(&backend.load().await.unwrap()));
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
