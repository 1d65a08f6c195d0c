// src/flag/audit.rs

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Actor, Role};

/// What happened to a flag update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// the new value was persisted
    Applied,
    /// the actor is not an administrator
    Denied,
    /// the actor toggled too often
    RateLimited,
    /// the flag backend could not read or persist the state
    Failed,
}

/// One audited flag update request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// event id
    pub id: Uuid,
    /// when the request was handled
    pub at: DateTime<Utc>,
    /// who asked
    pub actor_id: String,
    /// the actor's role at the time
    pub actor_role: Role,
    /// value before the change; `None` when nothing was read
    pub previous: Option<bool>,
    /// requested value
    pub requested: bool,
    /// result
    pub outcome: AuditOutcome,
}

impl AuditEvent {
    /// Creates an event stamped now.
    pub fn new(actor: &Actor, previous: Option<bool>, requested: bool, outcome: AuditOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            at: Utc::now(),
            actor_id: actor.id.clone(),
            actor_role: actor.role,
            previous,
            requested,
            outcome,
        }
    }
}

/// Receives audit events. Recording must not fail the flag update.
#[async_trait]
pub trait AuditSink: Send + Sync + Debug {
    /// Record one event.
    async fn record(&self, event: AuditEvent);
}

/// Writes audit events to the `audit` log target as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAuditSink;

#[async_trait]
impl AuditSink for LogAuditSink {
    async fn record(&self, event: AuditEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => log::info!(target: "audit", "{}", json),
            Err(e) => log::error!(target: "audit", "failed to serialize audit event {}: {}", event.id, e),
        }
    }
}

/// Keeps audit events in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far, oldest first.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) {
        self.events.lock().push(event);
    }
}
