//! Bounded storage of raw debug log fragments, keyed by message id.
//!
//! Every fragment the transport bridge reports (request, response, error,
//! validation result) is merged into the bucket of its message id, so the
//! UI can later show the full exchange behind a chat line.
//!
//! # Memory bound
//!
//! Each write pushes its id onto an insertion-order queue. When the queue
//! grows past the bound, an eviction pass is scheduled on the tokio runtime
//! instead of running on the write path. The pass pops ids from the front
//! and drops their buckets until the queue is back under the bound.
//!
//! Eviction is FIFO by first insertion, not LRU: a bucket that was touched
//! by a later channel write still goes when its oldest queue entry does.
//! The queue may therefore hold stale ids whose bucket is already gone;
//! popping those is a no-op.

use models::{DebugLogEntry, LogChannel};

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, trace};
use serde_json::Value;
use tokio::runtime::Handle as RuntimeHandle;

/// Default number of queue entries kept before eviction kicks in.
pub const DEFAULT_MAX_LOG_ENTRIES: usize = 500;

/// All fragments recorded for one message id, by channel.
pub type LogBucket = BTreeMap<LogChannel, Value>;

/// Result of an explicit [`BoundedLogStore::evict_overflow`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionOutcome {
    /// The pass ran; `removed` buckets were dropped.
    Evicted { removed: usize },
    /// Another pass was already in flight, nothing was done.
    AlreadyRunning,
}

#[derive(Default)]
struct LogStoreInner {
    buckets: HashMap<String, LogBucket>,
    order: VecDeque<String>,
}

/// Releases the in-flight flag when the pass ends, even on panic.
pub(crate) struct EvictionGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for EvictionGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Keyed log fragment storage with insertion-ordered eviction.
///
/// `Clone` is cheap and all clones share the same storage; the deferred
/// eviction task holds one.
#[derive(Clone)]
pub struct BoundedLogStore {
    inner: Arc<Mutex<LogStoreInner>>,
    evicting: Arc<AtomicBool>,
    max_entries: usize,
}

impl BoundedLogStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LogStoreInner::default())),
            evicting: Arc::new(AtomicBool::new(false)),
            max_entries: max_entries.max(1),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Merge `payload` into the bucket for `id` under `channel`.
    ///
    /// Other channels already in the bucket are kept; writing the same
    /// channel twice keeps the latest payload. O(1); overflow only schedules
    /// an eviction pass.
    pub fn record(&self, id: &str, channel: LogChannel, payload: Value) {
        let overflowing = {
            let mut inner = self.lock();
            inner
                .buckets
                .entry(id.to_string())
                .or_default()
                .insert(channel, payload);
            inner.order.push_back(id.to_string());
            inner.order.len() > self.max_entries
        };

        trace!("Recorded {channel} fragment for {id}");

        if overflowing {
            self.schedule_eviction();
        }
    }

    pub fn record_entry(&self, entry: &DebugLogEntry) {
        self.record(&entry.id, entry.channel, entry.data.clone());
    }

    /// Snapshot of the bucket for `id`.
    pub fn bucket(&self, id: &str) -> Option<LogBucket> {
        self.lock().buckets.get(id).cloned()
    }

    pub fn payload(&self, id: &str, channel: LogChannel) -> Option<Value> {
        self.lock()
            .buckets
            .get(id)
            .and_then(|bucket| bucket.get(&channel))
            .cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().buckets.contains_key(id)
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.lock().buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of the insertion-order queue, stale entries included.
    pub fn queue_len(&self) -> usize {
        self.lock().order.len()
    }

    /// Drop every bucket and queue entry. Calling it on an empty store is fine.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.buckets.clear();
        inner.order.clear();
    }

    /// Pop the oldest queue entries until at most `max_entries` remain.
    ///
    /// If a pass is already running this returns
    /// [`EvictionOutcome::AlreadyRunning`] right away instead of queuing a
    /// second one.
    pub fn evict_overflow(&self, max_entries: usize) -> EvictionOutcome {
        match self.try_begin_eviction() {
            Some(guard) => EvictionOutcome::Evicted {
                removed: self.evict_while_guarded(max_entries, guard),
            },
            None => EvictionOutcome::AlreadyRunning,
        }
    }

    /// Whether an eviction pass is currently scheduled or running.
    pub fn eviction_in_flight(&self) -> bool {
        self.evicting.load(Ordering::Acquire)
    }

    fn schedule_eviction(&self) {
        let Some(guard) = self.try_begin_eviction() else {
            trace!("Eviction already in flight, not scheduling another");
            return;
        };

        match RuntimeHandle::try_current() {
            Ok(runtime) => {
                let store = self.clone();
                runtime.spawn(async move {
                    let removed = store.evict_while_guarded(store.max_entries, guard);
                    debug!("Deferred eviction removed {removed} log buckets");
                });
            }
            Err(_) => {
                // No runtime to defer onto (plain unit tests, sync callers).
                let removed = self.evict_while_guarded(self.max_entries, guard);
                debug!("Inline eviction removed {removed} log buckets");
            }
        }
    }

    pub(crate) fn try_begin_eviction(&self) -> Option<EvictionGuard> {
        if self.evicting.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(EvictionGuard {
            flag: Arc::clone(&self.evicting),
        })
    }

    /// Run one pass. `guard` is released before the lock, so a write that
    /// was blocked on the lock sees the flag clear and can schedule the
    /// next pass itself.
    fn evict_while_guarded(&self, max_entries: usize, guard: EvictionGuard) -> usize {
        let mut inner = self.lock();
        let mut removed = 0;

        while inner.order.len() > max_entries {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            if inner.buckets.remove(&oldest).is_some() {
                removed += 1;
            }
        }

        drop(guard);
        drop(inner);
        removed
    }

    fn lock(&self) -> MutexGuard<'_, LogStoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BoundedLogStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LOG_ENTRIES)
    }
}
