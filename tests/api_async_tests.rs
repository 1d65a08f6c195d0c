use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use fixmarket_demo::api::DemoFeed;
use fixmarket_demo::core::{AdAnalyticsRow, RepairerListing};
use fixmarket_demo::flag::{Actor, MemoryAuditSink, MemoryFlagBackend};
use fixmarket_demo::storage::{MemoryRecordStore, RecordStore};
use fixmarket_demo::FMError;
use fixmarket_demo::test_utils::{get_test_config, listing, test_flag};
use fixmarket_demo::{Sourced, SyntheticCatalog};

struct Fixture {
    store: MemoryRecordStore<RepairerListing>,
    backend: MemoryFlagBackend,
    feed: DemoFeed<RepairerListing>,
}

fn fixture(rows: Vec<RepairerListing>) -> Fixture {
    let store = MemoryRecordStore::with_rows(rows);
    let backend = MemoryFlagBackend::default();
    let flag = test_flag(&backend, &MemoryAuditSink::new());
    let feed = DemoFeed::new("repairers", Arc::new(store.clone()), flag);
    Fixture { store, backend, feed }
}

fn synthetic_count(records: &[RepairerListing]) -> usize {
    records.iter().filter(|r| r.is_synthetic()).count()
}

#[tokio::test]
async fn test_refresh_reports_quarantined_rows() {
    let fx = fixture(vec![listing("r1", Some("imported")), listing("fake-demo", Some("demo"))]);

    let snap = fx.feed.refresh().await;
    assert!(!snap.is_stale());
    let view = snap.view.unwrap();
    assert_eq!(view.quarantined, 1);
    assert!(!view.demo_enabled);
    let ids: Vec<_> = view.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r1"]);
}

#[tokio::test]
async fn test_store_failure_keeps_last_good_view() {
    let fx = fixture(vec![listing("r1", None)]);
    fx.feed.refresh().await;

    fx.store.insert(listing("r2", None));
    fx.store.set_fail_on_fetch("connection reset");
    let snap = fx.feed.refresh().await;

    assert!(snap.is_stale());
    assert!(snap.error.as_deref().unwrap().contains("connection reset"));
    assert_eq!(snap.records().len(), 1, "the failed refresh must not publish partial data");

    fx.store.clear_fail_on_fetch();
    let snap = fx.feed.refresh().await;
    assert_eq!(snap.records().len(), 2);
}

#[tokio::test]
async fn test_flag_failure_keeps_last_good_view() {
    let fx = fixture(vec![listing("r1", None)]);
    let admin = Actor::administrator("admin-1");
    fx.feed.flag().set(&admin, true).await.unwrap();
    let before = fx.feed.refresh().await.view.unwrap();
    assert!(before.demo_enabled);

    fx.backend.set_fail_on_load(true);
    fx.store.insert(listing("r2", None));
    let snap = fx.feed.refresh().await;
    assert!(snap.is_stale());
    assert_eq!(snap.view.as_ref(), Some(&before));
}

#[tokio::test]
async fn test_toggle_off_purges_demo_rows_even_when_store_is_down() {
    let fx = fixture(vec![listing("r1", Some("imported"))]);
    let admin = Actor::administrator("admin-1");

    fx.feed.flag().set(&admin, true).await.unwrap();
    let on = fx.feed.refresh().await;
    assert_eq!(synthetic_count(on.records()), RepairerListing::catalog().len());

    fx.store.set_fail_on_fetch("maintenance");
    fx.feed.flag().set(&admin, false).await.unwrap();
    let off = fx.feed.refresh().await;

    assert!(off.is_stale());
    assert_eq!(synthetic_count(off.records()), 0);
    assert_eq!(off.records().len(), 1);
    assert!(!off.view.as_ref().unwrap().demo_enabled);

    // The purge sticks: a later failure of both collaborators cannot bring
    // the synthetic rows back.
    fx.backend.set_fail_on_load(true);
    let still_off = fx.feed.refresh().await;
    assert_eq!(synthetic_count(still_off.records()), 0);
    assert_eq!(synthetic_count(&fx.feed.current().unwrap().records), 0);
}

#[tokio::test]
async fn test_refresh_with_caller_supplied_flag() {
    let fx = fixture(vec![listing("r1", None)]);

    let on = fx.feed.refresh_with_flag(true).await;
    assert_eq!(on.records().len(), 1 + RepairerListing::catalog().len());

    fx.store.set_fail_on_fetch("timeout");
    let off = fx.feed.refresh_with_flag(false).await;
    assert!(off.is_stale());
    assert_eq!(synthetic_count(off.records()), 0);
}

#[tokio::test]
async fn test_feed_from_config_uses_memory_backends() {
    let config = get_test_config();
    let feed = DemoFeed::<AdAnalyticsRow>::from_config(&config, "ad_analytics").await.unwrap();
    assert_eq!(feed.name(), "ad_analytics");

    let snap = feed.refresh().await;
    assert!(snap.records().is_empty());

    feed.flag().set(&Actor::administrator("admin-1"), true).await.unwrap();
    let snap = feed.refresh().await;
    assert_eq!(snap.records(), AdAnalyticsRow::catalog());
}

/// Holds its first fetch until released, then answers from `inner`.
#[derive(Debug)]
struct GatedStore {
    inner: MemoryRecordStore<RepairerListing>,
    gate: Arc<Notify>,
    held: AtomicBool,
}

#[async_trait]
impl RecordStore<RepairerListing> for GatedStore {
    async fn fetch_all(&self) -> Result<Vec<RepairerListing>, FMError> {
        if !self.held.swap(true, Ordering::SeqCst) {
            self.gate.notified().await;
        }
        self.inner.fetch_all().await
    }
}

#[tokio::test]
async fn test_slow_refresh_cannot_restore_demo_rows_after_toggle_off() {
    let backend = MemoryFlagBackend::default();
    let gate = Arc::new(Notify::new());
    let store = GatedStore {
        inner: MemoryRecordStore::with_rows(vec![listing("r1", Some("imported"))]),
        gate: gate.clone(),
        held: AtomicBool::new(false),
    };
    let feed = DemoFeed::new("repairers", Arc::new(store), test_flag(&backend, &MemoryAuditSink::new()));
    let admin = Actor::administrator("admin-1");
    feed.flag().set(&admin, true).await.unwrap();

    // The first refresh reads the flag as on, then stalls on the store while
    // demo mode is switched off and a second refresh completes.
    let (slow, fast) = futures::join!(feed.refresh(), async {
        feed.flag().set(&admin, false).await.unwrap();
        let snap = feed.refresh().await;
        gate.notify_one();
        snap
    });

    assert!(!feed.flag().get().await.unwrap());
    assert_eq!(synthetic_count(fast.records()), 0);
    assert_eq!(synthetic_count(slow.records()), 0);

    let current = feed.current().unwrap();
    assert!(!current.demo_enabled);
    assert_eq!(synthetic_count(&current.records), 0);
    assert_eq!(current.records.len(), 1);
}
