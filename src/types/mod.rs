//! Core type definitions shared by configuration and records

mod log_level;
mod source;
mod storage;

pub use log_level::LogLevel;
pub use source::{RecordSource, SYNTHETIC_SOURCE_TAG};
pub use storage::StorageType;
