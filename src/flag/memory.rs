// src/flag/memory.rs

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use super::{FlagBackend, FlagState};
use crate::error::FMError;

/// Flag held in process memory. Clones share the same flag.
#[derive(Debug, Clone)]
pub struct MemoryFlagBackend {
    state: Arc<RwLock<FlagState>>,
    fail_on_load: Arc<Mutex<bool>>,
    fail_on_store: Arc<Mutex<bool>>,
}

impl MemoryFlagBackend {
    /// Creates a backend holding `initial`.
    pub fn new(initial: FlagState) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial)),
            fail_on_load: Arc::new(Mutex::new(false)),
            fail_on_store: Arc::new(Mutex::new(false)),
        }
    }

    /// Makes `load` fail until cleared, to simulate the remote setting being unreachable.
    pub fn set_fail_on_load(&self, fail: bool) {
        *self.fail_on_load.lock() = fail;
    }

    /// Makes `store` fail until cleared.
    pub fn set_fail_on_store(&self, fail: bool) {
        *self.fail_on_store.lock() = fail;
    }
}

impl Default for MemoryFlagBackend {
    fn default() -> Self {
        Self::new(FlagState::default())
    }
}

#[async_trait]
impl FlagBackend for MemoryFlagBackend {
    async fn load(&self) -> Result<FlagState, FMError> {
        if *self.fail_on_load.lock() {
            return Err(FMError::StorageError(
                "Simulated MemoryFlagBackend load failure".to_string(),
            ));
        }
        Ok(self.state.read().clone())
    }

    async fn store(&self, state: &FlagState) -> Result<(), FMError> {
        if *self.fail_on_store.lock() {
            return Err(FMError::StorageError(
                "Simulated MemoryFlagBackend store failure".to_string(),
            ));
        }
        *self.state.write() = state.clone();
        Ok(())
    }
}
