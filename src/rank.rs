//! Dual-indexed frequency ranking with time-based eviction.
//!
//! [`RankIndex`] tracks a counter and a last-update timestamp per distinct
//! id and keeps two ordered views of the same record set: one by count (for
//! top-N retrieval) and one by recency (for pruning stale ids). Both views
//! and the lookup table form a single consistency unit guarded by one mutex.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      RankIndex (one mutex)                          │
//! │                                                                     │
//! │   ┌─────────────────────────────┐                                   │
//! │   │ table: FxHashMap<id, state> │   state = (count, updated_at)     │
//! │   └─────────────────────────────┘                                   │
//! │                                                                     │
//! │   ┌─────────────────────────────┐  ┌──────────────────────────────┐ │
//! │   │ by_count: AvlTree           │  │ by_recency: AvlTree          │ │
//! │   │ key = (!count, id)          │  │ key = (updated_at, id)       │ │
//! │   │ ascending walk =            │  │ ascending walk =             │ │
//! │   │   highest count first,      │  │   oldest first               │ │
//! │   │   ids ascending on ties     │  │   (prune stops at cutoff)    │ │
//! │   └─────────────────────────────┘  └──────────────────────────────┘ │
//! │                                                                     │
//! │   Invariant: table, by_count, by_recency have identical membership; │
//! │   each record contributes exactly one key to each tree.             │
//! └─────────────────────────────────────────────────────────────────────┘
//!
//! Increment Flow
//! ──────────────
//!   increment("GET /", t):
//!     1. Existing record? retract (old_count, id) from by_count and
//!        (old_updated_at, id) from by_recency. A missing key here is an
//!        invariant violation and is returned as an error, never swallowed.
//!     2. count += 1, updated_at = t
//!     3. Insert the fresh composite keys into both trees.
//!
//! Prune Flow
//! ──────────
//!   prune_before(cutoff):
//!     Walk by_recency in ascending time order; every record strictly
//!     earlier than the cutoff is retracted from both trees and dropped
//!     from the table. The walk stops at the first record at-or-after the
//!     cutoff: everything behind it is newer still.
//! ```
//!
//! ## Operations
//!
//! | Operation        | Time           | Notes                            |
//! |------------------|----------------|----------------------------------|
//! | `increment`      | O(log n)       | Retract + reinsert in both trees |
//! | `top_n`          | O(k log n)     | Early-terminating ordered walk   |
//! | `prune_before`   | O(m log n)     | m = records removed              |
//! | `count_of`       | O(1)           | Table lookup                     |
//!
//! ## Example Usage
//!
//! ```
//! use topkit::rank::{RankIndex, Timestamp};
//!
//! # fn main() -> Result<(), topkit::error::InvariantError> {
//! let index = RankIndex::new();
//!
//! index.increment("GET /a", Timestamp::from_secs(1))?;
//! index.increment("GET /b", Timestamp::from_secs(2))?;
//! index.increment("GET /b", Timestamp::from_secs(3))?;
//!
//! let top = index.top_n(2);
//! assert_eq!(top[0].id.as_ref(), "GET /b");
//! assert_eq!(top[0].count, 2);
//! assert_eq!(top[1].id.as_ref(), "GET /a");
//!
//! // Evict everything last seen before t=2: only "GET /b" survives.
//! let removed = index.prune_before(Timestamp::from_secs(2))?;
//! assert_eq!(removed, 1);
//! assert_eq!(index.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! All public operations are complete critical sections over one internal
//! mutex; a reader never observes a partially retracted record. None of the
//! operations performs I/O while holding the lock.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::{debug, error};

use crate::ds::{AvlTree, SortField};
use crate::error::InvariantError;

#[cfg(feature = "metrics")]
use crate::metrics::{RankMetrics, RankMetricsSnapshot};

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// Nanosecond wall-clock timestamp.
///
/// The caller owns the clock: [`RankIndex::increment`] takes the timestamp
/// as a parameter, so schedulers and tests control time explicitly.
/// [`Timestamp::now`] is a convenience for wrappers that feed live input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Builds a timestamp from nanoseconds since the Unix epoch.
    #[inline]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Builds a timestamp from whole seconds since the Unix epoch.
    #[inline]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1_000_000_000)
    }

    /// Reads the system clock. A clock before the epoch clamps to zero.
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self(since_epoch.as_nanos() as u64)
    }

    /// Nanoseconds since the Unix epoch.
    #[inline]
    pub const fn as_nanos(self) -> u64 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// RankEntry
// ---------------------------------------------------------------------------

/// One row of a [`RankIndex::top_n`] snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankEntry {
    /// The observed line.
    pub id: Arc<str>,
    /// Occurrences since the record was created (or last pruned).
    pub count: u64,
    /// Timestamp of the most recent increment.
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Copy)]
struct RecordState {
    count: u64,
    updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Composite keys
// ---------------------------------------------------------------------------

// The count is stored bit-inverted so the ascending in-order walk visits
// the highest counts first while ids still break ties in ascending order.
fn count_key(count: u64, id: &Arc<str>) -> SortField {
    SortField::tuple([SortField::uint(!count), SortField::str(Arc::clone(id))])
}

fn recency_key(at: Timestamp, id: &Arc<str>) -> SortField {
    SortField::tuple([
        SortField::uint(at.as_nanos()),
        SortField::str(Arc::clone(id)),
    ])
}

// ---------------------------------------------------------------------------
// RankIndex
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct RankInner {
    table: FxHashMap<Arc<str>, RecordState>,
    by_count: AvlTree<SortField, Arc<str>>,
    by_recency: AvlTree<SortField, Arc<str>>,
    #[cfg(feature = "metrics")]
    metrics: RankMetrics,
}

impl RankInner {
    /// Removes both composite keys derived from `state`. Both keys must be
    /// present; a miss means the retract/reinsert protocol was broken.
    fn retract(&mut self, id: &Arc<str>, state: RecordState) -> Result<(), InvariantError> {
        if self.by_count.remove(&count_key(state.count, id)).is_none() {
            error!(id = id.as_ref(), count = state.count, "by-count key missing during retract");
            return Err(InvariantError::new(format!(
                "by-count key missing during retract (id={:?}, count={})",
                id, state.count
            )));
        }
        if self
            .by_recency
            .remove(&recency_key(state.updated_at, id))
            .is_none()
        {
            error!(
                id = id.as_ref(),
                updated_at = state.updated_at.as_nanos(),
                "by-recency key missing during retract"
            );
            return Err(InvariantError::new(format!(
                "by-recency key missing during retract (id={:?}, updated_at={})",
                id,
                state.updated_at.as_nanos()
            )));
        }
        Ok(())
    }

    fn insert_keys(&mut self, id: &Arc<str>, state: RecordState) {
        self.by_count
            .insert(count_key(state.count, id), Arc::clone(id));
        self.by_recency
            .insert(recency_key(state.updated_at, id), Arc::clone(id));
    }

    fn increment(&mut self, id: &str, at: Timestamp) -> Result<(), InvariantError> {
        #[cfg(feature = "metrics")]
        self.metrics.increment_calls.incr();

        let existing = self
            .table
            .get_key_value(id)
            .map(|(key, state)| (Arc::clone(key), *state));

        if let Some((id, prev)) = existing {
            self.retract(&id, prev)?;
            let next = RecordState {
                count: prev.count + 1,
                updated_at: at,
            };
            self.insert_keys(&id, next);
            self.table.insert(id, next);
            #[cfg(feature = "metrics")]
            self.metrics.reinserts.incr();
        } else {
            let id: Arc<str> = Arc::from(id);
            let state = RecordState {
                count: 1,
                updated_at: at,
            };
            self.insert_keys(&id, state);
            self.table.insert(id, state);
            #[cfg(feature = "metrics")]
            self.metrics.records_created.incr();
        }
        Ok(())
    }

    fn prune_before(&mut self, cutoff: Timestamp) -> Result<usize, InvariantError> {
        #[cfg(feature = "metrics")]
        self.metrics.prune_calls.incr();

        // Ascending-by-time walk; the first survivor ends the scan because
        // everything after it is at least as recent.
        let mut victims: Vec<(Arc<str>, RecordState)> = Vec::new();
        for (_, id) in self.by_recency.iter() {
            let Some(state) = self.table.get(id) else {
                return Err(InvariantError::new(format!(
                    "record {id:?} in by-recency index missing from lookup table"
                )));
            };
            if state.updated_at >= cutoff {
                break;
            }
            victims.push((Arc::clone(id), *state));
        }

        for (id, state) in &victims {
            self.retract(id, *state)?;
            self.table.remove(id);
        }

        #[cfg(feature = "metrics")]
        self.metrics.records_pruned.add(victims.len() as u64);

        if !victims.is_empty() {
            debug!(removed = victims.len(), "pruned stale records");
        }
        Ok(victims.len())
    }
}

/// Concurrent top-N frequency tracker with TTL-style eviction.
///
/// Owns a lookup table and two ordered indices over one record set. A single
/// internal mutex makes every public operation atomic with respect to the
/// others; see the [module docs](self) for the retract/reinsert protocol.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use topkit::rank::{RankIndex, Timestamp};
///
/// let index = Arc::new(RankIndex::new());
///
/// let handles: Vec<_> = (0..4)
///     .map(|t| {
///         let index = Arc::clone(&index);
///         thread::spawn(move || {
///             for i in 0..25 {
///                 let line = format!("worker {t}");
///                 index.increment(&line, Timestamp::from_nanos(i)).unwrap();
///             }
///         })
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
///
/// assert_eq!(index.len(), 4);
/// assert!(index.top_n(10).iter().all(|row| row.count == 25));
/// ```
#[derive(Debug, Default)]
pub struct RankIndex {
    inner: Mutex<RankInner>,
}

impl RankIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty index with table capacity reserved for `capacity`
    /// distinct ids.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(RankInner {
                table: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
                ..Default::default()
            }),
        }
    }

    /// Records one occurrence of `id` at time `at`.
    ///
    /// Unknown ids are created with count 1; known ids have their previous
    /// composite keys retracted from both ordered indices before the count
    /// and timestamp change, then fresh keys inserted. An `Err` means a
    /// retraction found its key missing — a protocol defect, not a runtime
    /// condition; the caller decides whether to abort or log and continue.
    pub fn increment(&self, id: &str, at: Timestamp) -> Result<(), InvariantError> {
        self.inner.lock().increment(id, at)
    }

    /// Returns up to `n` records ordered by descending count, ties broken
    /// by ascending id. The result is a snapshot: later mutation of the
    /// index does not affect it. `n == 0` yields an empty vector.
    pub fn top_n(&self, n: usize) -> Vec<RankEntry> {
        let inner = self.inner.lock();
        let mut rows = Vec::with_capacity(n.min(inner.table.len()));
        for (_, id) in inner.by_count.iter().take(n) {
            let state = inner
                .table
                .get(id)
                .expect("lookup table out of sync with by-count index");
            rows.push(RankEntry {
                id: Arc::clone(id),
                count: state.count,
                updated_at: state.updated_at,
            });
        }
        #[cfg(feature = "metrics")]
        {
            inner.metrics.top_n_calls.incr();
            inner.metrics.top_n_rows.add(rows.len() as u64);
        }
        rows
    }

    /// Removes every record whose `updated_at` is strictly earlier than
    /// `cutoff` and returns how many were removed. Records updated exactly
    /// at the cutoff survive. A pruned id seen again later is recreated
    /// fresh with count 1.
    pub fn prune_before(&self, cutoff: Timestamp) -> Result<usize, InvariantError> {
        self.inner.lock().prune_before(cutoff)
    }

    /// Number of distinct ids currently tracked.
    pub fn len(&self) -> usize {
        self.inner.lock().table.len()
    }

    /// Returns `true` if no ids are tracked.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().table.is_empty()
    }

    /// Returns `true` if `id` is currently tracked.
    pub fn contains(&self, id: &str) -> bool {
        self.inner.lock().table.contains_key(id)
    }

    /// Current count for `id`, if tracked.
    pub fn count_of(&self, id: &str) -> Option<u64> {
        self.inner.lock().table.get(id).map(|state| state.count)
    }

    /// Drops all records.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.table.clear();
        inner.by_count.clear();
        inner.by_recency.clear();
    }

    /// Copies the operation counters accumulated so far.
    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> RankMetricsSnapshot {
        let inner = self.inner.lock();
        inner.metrics.snapshot(inner.table.len())
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let inner = self.inner.lock();
        inner.by_count.debug_validate_invariants();
        inner.by_recency.debug_validate_invariants();
        assert_eq!(inner.table.len(), inner.by_count.len());
        assert_eq!(inner.table.len(), inner.by_recency.len());

        for (id, state) in &inner.table {
            assert_eq!(
                inner.by_count.get(&count_key(state.count, id)),
                Some(id),
                "by-count key missing or misassigned for {id:?}"
            );
            assert_eq!(
                inner.by_recency.get(&recency_key(state.updated_at, id)),
                Some(id),
                "by-recency key missing or misassigned for {id:?}"
            );
        }
    }
}
