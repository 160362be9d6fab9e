// Unit tests for the bounded log store
// Covers merge semantics, FIFO eviction, stale queue entries and the in-flight guard

use crate::log_store::{BoundedLogStore, EvictionOutcome};

use models::{DebugLogEntry, LogChannel};

use serde_json::json;

/// **VALUE**: Verifies fragments for one message id merge into one bucket.
///
/// **WHY THIS MATTERS**: The inspection panel shows request, response and
/// validation result side by side; they arrive as separate writes.
///
/// **BUG THIS CATCHES**: Would catch a write replacing the whole bucket instead of
/// inserting one channel, or the same channel keeping the first payload.
#[test]
fn given_several_channels_when_recorded_then_bucket_merges_and_keeps_latest() {
    // GIVEN: An empty store
    let store = BoundedLogStore::new(10);

    // WHEN: Two channels are written, then the first one again
    store.record("m1", LogChannel::Request, json!({"n": 1}));
    store.record("m1", LogChannel::Response, json!({"n": 2}));
    store.record("m1", LogChannel::Request, json!({"n": 3}));

    // THEN: Both channels are present and the request is the latest one
    let bucket = store.bucket("m1").unwrap();
    assert_eq!(bucket.len(), 2);
    assert_eq!(bucket.get(&LogChannel::Request), Some(&json!({"n": 3})));
    assert_eq!(bucket.get(&LogChannel::Response), Some(&json!({"n": 2})));
    assert_eq!(store.len(), 1);
    assert_eq!(store.queue_len(), 3, "one queue push per write");
}

/// **VALUE**: Verifies debug log entries land under their own channel.
///
/// **BUG THIS CATCHES**: Would catch `record_entry` dropping the payload or the type.
#[test]
fn given_debug_log_entry_when_recorded_then_payload_is_reachable_by_channel() {
    let store = BoundedLogStore::default();
    let entry = DebugLogEntry::new(LogChannel::ValidationError, "m7", json!(["bad"]));

    store.record_entry(&entry);

    assert_eq!(store.max_entries(), 500);
    assert_eq!(
        store.payload("m7", LogChannel::ValidationError),
        Some(json!(["bad"]))
    );
    assert_eq!(store.payload("m7", LogChannel::Request), None);
}

/// **VALUE**: Verifies overflow evicts the oldest inserted id first.
///
/// **WHY THIS MATTERS**: The store is the only thing bounding memory for a
/// long-running session.
///
/// **BUG THIS CATCHES**: Would catch evicting the newest entry, or not evicting at all
/// when no runtime is available to defer onto.
#[test]
fn given_full_store_without_runtime_when_recording_then_oldest_is_evicted_inline() {
    // GIVEN: A store bounded at two entries
    let store = BoundedLogStore::new(2);
    store.record("a", LogChannel::Request, json!(1));
    store.record("b", LogChannel::Request, json!(2));

    // WHEN: A third id is recorded
    store.record("c", LogChannel::Request, json!(3));

    // THEN: The first one is gone
    assert!(!store.contains("a"));
    assert!(store.contains("b"));
    assert!(store.contains("c"));
    assert_eq!(store.queue_len(), 2);
    assert!(!store.eviction_in_flight());
}

/// **VALUE**: Verifies eviction is by first insertion, not last touch, and tolerates
/// stale queue entries.
///
/// **WHY THIS MATTERS**: A bucket written on two channels has two queue entries. The
/// first pops the bucket; the second must be a harmless no-op later.
///
/// **BUG THIS CATCHES**: Would catch an LRU "fix", or a panic/miscount on stale ids.
#[test]
fn given_duplicate_queue_entries_when_evicting_then_stale_ids_are_skipped() {
    // GIVEN: "a" written twice, then "b"
    let store = BoundedLogStore::new(3);
    store.record("a", LogChannel::Request, json!(1));
    store.record("a", LogChannel::Response, json!(2));
    store.record("b", LogChannel::Request, json!(3));

    // WHEN: "c" overflows the queue
    store.record("c", LogChannel::Request, json!(4));

    // THEN: "a" goes even though it was touched after its first write
    assert!(!store.contains("a"));
    assert_eq!(store.len(), 2);
    assert_eq!(store.queue_len(), 3, "the second 'a' entry is still queued");

    // WHEN: "d" overflows again and pops the stale "a"
    store.record("d", LogChannel::Request, json!(5));

    // THEN: Nothing live was removed for it
    assert!(store.contains("b"));
    assert!(store.contains("c"));
    assert!(store.contains("d"));
    assert_eq!(store.len(), 3);
    assert_eq!(store.queue_len(), 3);
}

/// **VALUE**: Verifies an explicit pass reports how many buckets it dropped.
#[test]
fn given_entries_when_evict_overflow_then_trims_to_requested_bound() {
    let store = BoundedLogStore::new(100);
    for id in ["a", "b", "c", "d", "e"] {
        store.record(id, LogChannel::Response, json!(id));
    }

    let outcome = store.evict_overflow(2);

    assert_eq!(outcome, EvictionOutcome::Evicted { removed: 3 });
    assert!(store.contains("d"));
    assert!(store.contains("e"));
    assert_eq!(store.len(), 2);
}

/// **VALUE**: Verifies concurrent eviction requests collapse into one pass.
///
/// **WHY THIS MATTERS**: Two passes interleaving could each decide to pop
/// entries, evicting more than needed.
///
/// **BUG THIS CATCHES**: Would catch a guard that is not checked, or not released
/// when the pass ends.
#[test]
fn given_pass_in_flight_when_evict_overflow_then_returns_already_running() {
    // GIVEN: A store with a pass in flight
    let store = BoundedLogStore::new(100);
    store.record("a", LogChannel::Request, json!(1));
    let guard = store.try_begin_eviction().unwrap();

    // WHEN: A second pass is requested
    let outcome = store.evict_overflow(0);

    // THEN: It returns immediately without touching anything
    assert_eq!(outcome, EvictionOutcome::AlreadyRunning);
    assert!(store.contains("a"));

    // WHEN: The first pass ends
    drop(guard);

    // THEN: A new pass runs
    assert_eq!(store.evict_overflow(0), EvictionOutcome::Evicted { removed: 1 });
    assert!(store.is_empty());
}

/// **VALUE**: Verifies eviction is deferred off the write path inside a runtime, and a
/// burst of writes while it is pending schedules no second pass.
///
/// **WHY THIS MATTERS**: Writes happen on the console actor; they must stay O(1).
///
/// **BUG THIS CATCHES**: Would catch eviction running inline on the write, or the
/// in-flight flag never being released by the deferred task.
#[tokio::test]
async fn given_runtime_when_overflowing_then_eviction_runs_deferred_once() {
    // GIVEN: A store bounded at two entries
    let store = BoundedLogStore::new(2);
    store.record("a", LogChannel::Request, json!(1));
    store.record("b", LogChannel::Request, json!(2));

    // WHEN: Two more writes overflow it before the runtime gets a turn
    store.record("c", LogChannel::Request, json!(3));
    store.record("d", LogChannel::Request, json!(4));

    // THEN: Nothing is evicted yet, one pass is pending
    assert!(store.contains("a"));
    assert!(store.eviction_in_flight());
    assert_eq!(store.queue_len(), 4);

    // WHEN: The deferred pass gets to run
    while store.eviction_in_flight() {
        tokio::task::yield_now().await;
    }

    // THEN: It trimmed all the way back to the bound
    assert!(!store.contains("a"));
    assert!(!store.contains("b"));
    assert!(store.contains("c"));
    assert!(store.contains("d"));
    assert_eq!(store.queue_len(), 2);
}

/// **VALUE**: Verifies `clear` empties everything and can be repeated.
#[test]
fn given_store_when_cleared_twice_then_empty_both_times() {
    let store = BoundedLogStore::new(10);
    store.record("a", LogChannel::Request, json!(1));

    store.clear();
    store.clear();

    assert!(store.is_empty());
    assert_eq!(store.queue_len(), 0);
    assert_eq!(store.bucket("a"), None);
}

/// **VALUE**: Verifies concurrent writers never leave the store above its bound once
/// every pass has finished.
///
/// **WHY THIS MATTERS**: A write that lands while a pass is finishing sees the
/// in-flight flag set and schedules nothing; it relies on that pass still being able
/// to see its entry.
///
/// **BUG THIS CATCHES**: Would catch the flag being released after the lock, which
/// lets a write slip in between, skip scheduling, and stay over the bound forever.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn given_concurrent_writers_when_all_passes_done_then_queue_within_bound() {
    // GIVEN: A small store shared by several writers
    let store = BoundedLogStore::new(3);

    // WHEN: They all write at once
    let writers: Vec<_> = (0..4)
        .map(|writer| {
            let store = store.clone();
            tokio::spawn(async move {
                for n in 0..200 {
                    store.record(&format!("w{writer}-{n}"), LogChannel::Request, json!(n));
                    if n % 16 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect();
    for writer in writers {
        writer.await.unwrap();
    }

    // THEN: Once no pass is pending, the queue is back within the bound
    while store.eviction_in_flight() {
        tokio::task::yield_now().await;
    }
    assert!(store.queue_len() <= 3, "queue_len = {}", store.queue_len());
    assert!(store.len() <= 3);
}
