// src/flag/mod.rs

//! The deployment-wide demo mode flag.
//!
//! [`DemoModeFlag`] is the only way the rest of the crate reads or changes the
//! flag. Reads always go to the backend; nothing is cached here, so a toggle is
//! visible to the very next reconciliation. Updates are restricted to
//! administrators, throttled per actor and audited.

pub mod audit;
pub mod file;
pub mod memory;

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::config::Config;
use crate::error::FMError;
use crate::rate_limiter::{RateLimitSettings, RateLimiter};
use crate::types::StorageType;

pub use audit::{AuditEvent, AuditOutcome, AuditSink, LogAuditSink, MemoryAuditSink};
pub use file::FileFlagBackend;
pub use memory::MemoryFlagBackend;

/// Persisted state of the flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagState {
    /// whether synthetic records are merged into the views
    pub enabled: bool,
    /// last change, `None` until an administrator first sets the flag
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// id of the administrator who made the last change
    #[serde(default)]
    pub updated_by: Option<String>,
}

impl FlagState {
    /// A never-touched flag with the given initial value.
    pub fn initial(enabled: bool) -> Self {
        Self {
            enabled,
            updated_at: None,
            updated_by: None,
        }
    }
}

impl Default for FlagState {
    fn default() -> Self {
        Self::initial(false)
    }
}

/// Role of the user acting on the flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May toggle demo mode
    Administrator,
    /// Regular client or technician account
    Member,
}

/// Who is asking. Identity is established upstream; this crate only checks
/// the role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// account id
    pub id: String,
    /// account role
    pub role: Role,
}

impl Actor {
    /// An administrator account.
    pub fn administrator(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Administrator,
        }
    }

    /// A regular account.
    pub fn member(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Member,
        }
    }

    /// Whether this actor may change deployment-wide settings.
    pub fn is_administrator(&self) -> bool {
        self.role == Role::Administrator
    }
}

/// Where the flag is persisted.
#[async_trait]
pub trait FlagBackend: Send + Sync + Debug {
    /// Current persisted state.
    async fn load(&self) -> Result<FlagState, FMError>;

    /// Replace the persisted state.
    async fn store(&self, state: &FlagState) -> Result<(), FMError>;
}

/// Builds the flag backend selected by the configuration.
pub async fn create_flag_backend(config: &Config) -> Result<Arc<dyn FlagBackend>, FMError> {
    let initial = FlagState::initial(config.demo.default_enabled);
    match config.storage.storage_type {
        StorageType::Memory => Ok(Arc::new(MemoryFlagBackend::new(initial))),
        StorageType::File => {
            let backend = FileFlagBackend::new(config.flag_path(), initial).await?;
            Ok(Arc::new(backend))
        }
    }
}

/// Read/update access to the demo mode flag.
#[derive(Debug, Clone)]
pub struct DemoModeFlag {
    backend: Arc<dyn FlagBackend>,
    audit: Arc<dyn AuditSink>,
    limiter: RateLimiter,
}

impl DemoModeFlag {
    /// Creates a flag over `backend`, auditing to `audit`.
    pub fn new(backend: Arc<dyn FlagBackend>, audit: Arc<dyn AuditSink>, limiter: RateLimiter) -> Self {
        Self {
            backend,
            audit,
            limiter,
        }
    }

    /// Builds the configured backend with log-based auditing.
    pub async fn from_config(config: &Config) -> Result<Self, FMError> {
        let backend = create_flag_backend(config).await?;
        Ok(Self::new(
            backend,
            Arc::new(LogAuditSink),
            RateLimiter::new(RateLimitSettings::from(&config.rate_limit)),
        ))
    }

    /// Whether demo mode is on.
    pub async fn get(&self) -> Result<bool, FMError> {
        Ok(self.backend.load().await?.enabled)
    }

    /// Full persisted state, including who changed it last.
    pub async fn state(&self) -> Result<FlagState, FMError> {
        self.backend.load().await
    }

    /// Turns demo mode on or off.
    ///
    /// Only administrators may do this; refusals are audited too. Setting the
    /// flag to its current value still records a change event.
    ///
    /// # Errors
    ///
    /// `NotAllowed` for non-administrators, `RateLimited` when the actor
    /// toggles too often, or the backend's error if reading or persisting
    /// fails. Every outcome is audited.
    pub async fn set(&self, actor: &Actor, enabled: bool) -> Result<FlagState, FMError> {
        if !actor.is_administrator() {
            log::warn!("demo mode: {} ({}) tried to set flag to {}", actor.id, actor.role, enabled);
            self.audit
                .record(AuditEvent::new(actor, None, enabled, AuditOutcome::Denied))
                .await;
            return Err(FMError::not_allowed(format!(
                "'{}' is not an administrator and cannot change demo mode",
                actor.id
            )));
        }

        if let Err(e) = self.limiter.check(&actor.id) {
            self.audit
                .record(AuditEvent::new(actor, None, enabled, AuditOutcome::RateLimited))
                .await;
            return Err(e.into());
        }

        let previous = match self.backend.load().await {
            Ok(previous) => previous,
            Err(e) => return Err(self.failed(actor, None, enabled, e).await),
        };
        let next = FlagState {
            enabled,
            updated_at: Some(Utc::now()),
            updated_by: Some(actor.id.clone()),
        };
        if let Err(e) = self.backend.store(&next).await {
            return Err(self.failed(actor, Some(previous.enabled), enabled, e).await);
        }

        log::info!(
            "demo mode set to {} by {} (was {})",
            enabled,
            actor.id,
            previous.enabled
        );
        self.audit
            .record(AuditEvent::new(
                actor,
                Some(previous.enabled),
                enabled,
                AuditOutcome::Applied,
            ))
            .await;

        Ok(next)
    }

    async fn failed(&self, actor: &Actor, previous: Option<bool>, enabled: bool, error: FMError) -> FMError {
        log::error!("demo mode: update to {} by {} failed: {}", enabled, actor.id, error);
        self.audit
            .record(AuditEvent::new(actor, previous, enabled, AuditOutcome::Failed))
            .await;
        error
    }
}
