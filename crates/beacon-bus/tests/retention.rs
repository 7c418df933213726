//! End-to-end tests for the release notification bus: producer contract,
//! retention behavior, and failure semantics over a shared store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use beacon_bus::{BusConfig, EventSink, ReleaseBus, TxnStatus};
use beacon_store::{topic, MemoryStore, NotificationStore, ReleaseEvent, StoreError};

/// Sink that records every call for assertions.
#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<(String, String)>>,
    errors: Mutex<Vec<String>>,
    transactions: Mutex<Vec<(String, TxnStatus)>>,
}

impl EventSink for RecordingSink {
    fn log_event(&self, name: &str, data: &str) {
        self.events.lock().push((name.to_string(), data.to_string()));
    }

    fn log_error(&self, error: &dyn std::error::Error) {
        self.errors.lock().push(error.to_string());
    }

    fn record_transaction(&self, _category: &str, name: &str, status: TxnStatus) {
        self.transactions.lock().push((name.to_string(), status));
    }
}

/// Store wrapper whose appends can be switched to fail, for exercising
/// the durable-write failure path.
struct FlakyStore {
    inner: MemoryStore,
    fail_appends: AtomicBool,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_appends: AtomicBool::new(false),
        }
    }

    fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }
}

impl NotificationStore for FlakyStore {
    fn append(&self, topic: &str, payload: &str) -> Result<ReleaseEvent, StoreError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected append failure".into()));
        }
        self.inner.append(topic, payload)
    }

    fn find_by_id(&self, id: u64) -> Result<Option<ReleaseEvent>, StoreError> {
        self.inner.find_by_id(id)
    }

    fn find_older_than(
        &self,
        payload: &str,
        before_id: u64,
        limit: usize,
    ) -> Result<Vec<ReleaseEvent>, StoreError> {
        self.inner.find_older_than(payload, before_id, limit)
    }

    fn delete_batch(&self, ids: &[u64]) -> Result<usize, StoreError> {
        self.inner.delete_batch(ids)
    }

    fn find_newer_than(&self, cursor: u64, limit: usize) -> Result<Vec<ReleaseEvent>, StoreError> {
        self.inner.find_newer_than(cursor, limit)
    }

    fn latest_for_payload(&self, payload: &str) -> Result<Option<ReleaseEvent>, StoreError> {
        self.inner.latest_for_payload(payload)
    }
}

fn fast_config() -> BusConfig {
    BusConfig {
        poll_timeout: Duration::from_millis(20),
        idle_backoff: Duration::from_millis(20),
        ..BusConfig::default()
    }
}

fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) {
    let start = Instant::now();
    while !done() {
        assert!(start.elapsed() < deadline, "condition not reached in time");
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn publish_then_retention_keeps_only_newest_per_payload() {
    let store = Arc::new(MemoryStore::new());
    let bus = ReleaseBus::builder(Arc::clone(&store) as _)
        .config(fast_config())
        .start()
        .unwrap();

    for _ in 0..5 {
        bus.send("app-a+default+application", topic::RELEASES).unwrap();
    }
    bus.send("app-b+default+application", topic::RELEASES).unwrap();

    // Four superseded app-a rows get reclaimed; the newest app-a row and
    // the app-b row survive.
    wait_until(Duration::from_secs(3), || bus.cleaner().events_cleaned() == 4);
    wait_until(Duration::from_secs(3), || store.len() == 2);

    let latest_a = store
        .latest_for_payload("app-a+default+application")
        .unwrap()
        .unwrap();
    assert!(store.find_by_id(latest_a.id()).unwrap().is_some());
    assert!(store
        .latest_for_payload("app-b+default+application")
        .unwrap()
        .is_some());

    bus.shutdown().unwrap();
}

#[test]
fn consumer_cursor_sees_new_rows_in_order() {
    let store = Arc::new(MemoryStore::new());
    let bus = ReleaseBus::builder(Arc::clone(&store) as _)
        .config(fast_config())
        .start()
        .unwrap();

    bus.send("p1", topic::RELEASES).unwrap();
    let cursor = store.latest_for_payload("p1").unwrap().unwrap().id();

    bus.send("p2", topic::RELEASES).unwrap();
    bus.send("p3", topic::RELEASES).unwrap();

    let newer = store.find_newer_than(cursor, 100).unwrap();
    assert_eq!(newer.len(), 2);
    assert_eq!(newer[0].payload(), "p2");
    assert_eq!(newer[1].payload(), "p3");
    assert!(newer[0].id() > cursor && newer[1].id() > newer[0].id());

    bus.shutdown().unwrap();
}

#[test]
fn unsupported_topic_reaches_neither_store_nor_sink() {
    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(RecordingSink::default());
    let bus = ReleaseBus::builder(Arc::clone(&store) as _)
        .sink(Arc::clone(&sink) as _)
        .config(fast_config())
        .start()
        .unwrap();

    bus.send("app+default+application", "instance-heartbeats").unwrap();

    assert!(store.is_empty());
    assert!(sink.events.lock().is_empty());
    assert!(sink.transactions.lock().is_empty());

    bus.shutdown().unwrap();
}

#[test]
fn failed_append_propagates_and_leaves_no_ghost_row() {
    let store = Arc::new(FlakyStore::new());
    let sink = Arc::new(RecordingSink::default());
    let bus = ReleaseBus::builder(Arc::clone(&store) as _)
        .sink(Arc::clone(&sink) as _)
        .config(fast_config())
        .start()
        .unwrap();

    store.fail_appends(true);
    let err = bus.send("p", topic::RELEASES).unwrap_err();
    assert!(err.to_string().contains("injected append failure"));

    // No partial row: a failed send is indistinguishable from no change.
    assert!(store.find_newer_than(0, 10).unwrap().is_empty());
    let transactions = sink.transactions.lock();
    assert_eq!(transactions.last(), Some(&("send".to_string(), TxnStatus::Failed)));
    drop(transactions);

    // The bus stays usable afterwards.
    store.fail_appends(false);
    bus.send("p", topic::RELEASES).unwrap();
    assert_eq!(
        sink.transactions.lock().last(),
        Some(&("send".to_string(), TxnStatus::Success))
    );

    bus.shutdown().unwrap();
}

#[test]
fn cleaner_emits_one_event_per_reclaimed_row() {
    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(RecordingSink::default());
    let bus = ReleaseBus::builder(Arc::clone(&store) as _)
        .sink(Arc::clone(&sink) as _)
        .config(fast_config())
        .start()
        .unwrap();

    for _ in 0..3 {
        bus.send("p", topic::RELEASES).unwrap();
    }
    wait_until(Duration::from_secs(3), || bus.cleaner().events_cleaned() == 2);

    let events = sink.events.lock();
    let clean_events: Vec<_> = events
        .iter()
        .filter(|(name, _)| name == "release.clean.p")
        .collect();
    assert_eq!(clean_events.len(), 2);
    drop(events);

    bus.shutdown().unwrap();
}

#[test]
fn burst_beyond_queue_capacity_neither_blocks_nor_fails() {
    let store = Arc::new(MemoryStore::new());
    // Tiny queue and a slow-to-wake cleaner maximize shed offers.
    let config = BusConfig {
        clean_queue_capacity: 2,
        ..BusConfig::default()
    };
    let bus = ReleaseBus::builder(Arc::clone(&store) as _)
        .config(config)
        .start()
        .unwrap();

    let start = Instant::now();
    for i in 0..200 {
        // Unique payloads, so nothing is superseded and the row count
        // stays exact while the cleaner runs alongside.
        bus.send(&format!("p{i}"), topic::RELEASES).unwrap();
    }
    // Dropping cleanup offers must not slow the producer down.
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(store.len(), 200);
    assert!(bus.sender().cleanups_dropped() > 0);

    bus.shutdown().unwrap();
}

#[test]
fn two_buses_on_one_store_clean_without_coordination() {
    // Two sibling processes embedding the bus share the same store; both
    // cleaners run with no leader election and must not interfere.
    let store = Arc::new(MemoryStore::new());
    let bus_a = ReleaseBus::builder(Arc::clone(&store) as _)
        .config(fast_config())
        .start()
        .unwrap();
    let bus_b = ReleaseBus::builder(Arc::clone(&store) as _)
        .config(fast_config())
        .start()
        .unwrap();

    for _ in 0..10 {
        bus_a.send("p", topic::RELEASES).unwrap();
        bus_b.send("p", topic::RELEASES).unwrap();
    }

    wait_until(Duration::from_secs(3), || store.len() == 1);
    let survivor = store.latest_for_payload("p").unwrap().unwrap();
    assert_eq!(survivor.id(), 20);

    bus_a.shutdown().unwrap();
    bus_b.shutdown().unwrap();
}

#[test]
fn shared_sender_handles_publish_concurrently() {
    let store = Arc::new(MemoryStore::new());
    let bus = ReleaseBus::builder(Arc::clone(&store) as _)
        .config(fast_config())
        .start()
        .unwrap();

    let mut handles = Vec::new();
    for t in 0..4 {
        let sender = bus.sender().clone();
        handles.push(std::thread::spawn(move || {
            for i in 0..50 {
                sender
                    .send(&format!("app-{t}+default+ns-{i}"), topic::RELEASES)
                    .unwrap();
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    // Every payload is unique, so nothing is superseded and every row
    // must still be present with distinct ids.
    assert_eq!(store.len(), 200);
    let all = store.find_newer_than(0, 500).unwrap();
    assert!(all.windows(2).all(|w| w[0].id() < w[1].id()));

    bus.shutdown().unwrap();
}
