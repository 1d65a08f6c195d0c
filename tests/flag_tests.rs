use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use fixmarket_demo::config::Config;
use fixmarket_demo::flag::{
    Actor, AuditOutcome, DemoModeFlag, FlagState, MemoryAuditSink, MemoryFlagBackend,
};
use fixmarket_demo::rate_limiter::{RateLimitError, RateLimitSettings, RateLimiter};
use fixmarket_demo::test_utils::test_flag;
use fixmarket_demo::{FMError, StorageType};
use tempfile::tempdir;

#[tokio::test]
async fn test_flag_defaults_off() {
    let flag = test_flag(&MemoryFlagBackend::default(), &MemoryAuditSink::new());
    assert!(!flag.get().await.unwrap());
    assert_eq!(flag.state().await.unwrap(), FlagState::default());
}

#[tokio::test]
async fn test_admin_can_toggle_and_is_audited() {
    let backend = MemoryFlagBackend::default();
    let audit = MemoryAuditSink::new();
    let flag = test_flag(&backend, &audit);
    let admin = Actor::administrator("admin-1");

    let state = flag.set(&admin, true).await.unwrap();
    assert!(state.enabled);
    assert_eq!(state.updated_by.as_deref(), Some("admin-1"));
    assert!(state.updated_at.is_some());
    assert!(flag.get().await.unwrap());

    flag.set(&admin, false).await.unwrap();
    assert!(!flag.get().await.unwrap());

    let events = audit.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].outcome, AuditOutcome::Applied);
    assert_eq!(events[0].previous, Some(false));
    assert!(events[0].requested);
    assert_eq!(events[1].previous, Some(true));
    assert_ne!(events[0].id, events[1].id);
}

#[tokio::test]
async fn test_member_cannot_toggle() {
    let audit = MemoryAuditSink::new();
    let flag = test_flag(&MemoryFlagBackend::default(), &audit);

    let err = flag.set(&Actor::member("client-9"), true).await.unwrap_err();
    assert_matches!(err, FMError::NotAllowed(_));
    assert!(!flag.get().await.unwrap());

    let events = audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, AuditOutcome::Denied);
    assert_eq!(events[0].actor_id, "client-9");
}

#[tokio::test]
async fn test_toggles_are_rate_limited_per_actor() {
    let audit = MemoryAuditSink::new();
    let flag = DemoModeFlag::new(
        Arc::new(MemoryFlagBackend::default()),
        Arc::new(audit.clone()),
        RateLimiter::new(RateLimitSettings {
            max_requests: 2,
            time_window: Duration::from_secs(3600),
            ban_duration: Duration::from_secs(3600),
            violations_before_ban: 5,
        }),
    );
    let admin = Actor::administrator("admin-1");

    flag.set(&admin, true).await.unwrap();
    flag.set(&admin, false).await.unwrap();
    let err = flag.set(&admin, true).await.unwrap_err();
    assert_matches!(err, FMError::RateLimited(RateLimitError::LimitExceeded(2, _)));
    assert!(!flag.get().await.unwrap(), "refused update must not be persisted");

    // another administrator has their own budget
    flag.set(&Actor::administrator("admin-2"), true).await.unwrap();

    let outcomes: Vec<_> = audit.events().iter().map(|e| e.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            AuditOutcome::Applied,
            AuditOutcome::Applied,
            AuditOutcome::RateLimited,
            AuditOutcome::Applied
        ]
    );
}

#[tokio::test]
async fn test_unreachable_flag_is_an_error() {
    let backend = MemoryFlagBackend::default();
    backend.set_fail_on_load(true);
    let flag = test_flag(&backend, &MemoryAuditSink::new());
    assert!(flag.get().await.unwrap_err().is_retrieval_failure());

    backend.set_fail_on_load(false);
    assert!(!flag.get().await.unwrap());
}

#[tokio::test]
async fn test_backend_failures_during_update_are_audited() {
    let backend = MemoryFlagBackend::default();
    let audit = MemoryAuditSink::new();
    let flag = test_flag(&backend, &audit);
    let admin = Actor::administrator("admin-1");

    backend.set_fail_on_load(true);
    let err = flag.set(&admin, true).await.unwrap_err();
    assert!(err.is_retrieval_failure());
    backend.set_fail_on_load(false);

    backend.set_fail_on_store(true);
    let err = flag.set(&admin, true).await.unwrap_err();
    assert_matches!(err, FMError::StorageError(_));
    backend.set_fail_on_store(false);
    assert!(!flag.get().await.unwrap());

    let events = audit.events();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.outcome == AuditOutcome::Failed && e.requested));
    assert_eq!(events[0].previous, None);
    assert_eq!(events[1].previous, Some(false));
}

#[tokio::test]
async fn test_file_flag_persists_across_instances() {
    let dir = tempdir().unwrap();
    let mut config = Config::default();
    config.storage.storage_type = StorageType::File;
    config.storage.base_path = dir.path().to_string_lossy().into();

    let flag = DemoModeFlag::from_config(&config).await.unwrap();
    assert!(!flag.get().await.unwrap());
    flag.set(&Actor::administrator("admin-1"), true).await.unwrap();
    assert!(config.flag_path().exists());

    let reopened = DemoModeFlag::from_config(&config).await.unwrap();
    assert!(reopened.get().await.unwrap());
    assert_eq!(reopened.state().await.unwrap().updated_by.as_deref(), Some("admin-1"));
}

#[tokio::test]
async fn test_configured_default_applies_until_first_set() {
    let mut config = Config::default();
    config.demo.default_enabled = true;
    let flag = DemoModeFlag::from_config(&config).await.unwrap();
    assert!(flag.get().await.unwrap());
}
