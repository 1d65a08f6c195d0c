use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend used for both the record collections and the persisted demo flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// In-memory storage (tests, local previews)
    Memory,
    /// JSON files under `storage.base_path`
    File,
}

impl Default for StorageType {
    fn default() -> Self {
        Self::Memory
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::File => write!(f, "file"),
        }
    }
}

impl FromStr for StorageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            _ => Err(format!("Invalid storage type: '{}'", s)),
        }
    }
}
