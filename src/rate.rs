//! Windowed per-key rate monitoring.
//!
//! [`RateMonitor`] accumulates hit counts per key and turns them into
//! events-per-second rates between successive snapshots. It is independent
//! of the rank index and uses its own lock, so a rate snapshot and a top-N
//! snapshot taken by the same scheduler may reflect slightly different
//! instants; that skew is accepted.
//!
//! ## Example Usage
//!
//! ```
//! use std::time::{Duration, Instant};
//! use topkit::rate::RateMonitor;
//!
//! let monitor = RateMonitor::new();
//! let t0 = Instant::now();
//!
//! // The first snapshot only establishes the baseline.
//! assert!(monitor.snapshot_at(t0).is_empty());
//!
//! for _ in 0..4 {
//!     monitor.record("GET /");
//! }
//!
//! let rates = monitor.snapshot_at(t0 + Duration::from_secs(2));
//! assert_eq!(rates["GET /"], 2.0);
//! ```

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
struct RateInner {
    last_snapshot_at: Option<Instant>,
    counts: FxHashMap<Arc<str>, u64>,
}

/// Sliding-window counter producing per-key rates between snapshots.
///
/// Keys with zero hits in a window are absent from the snapshot result;
/// callers treat a missing key as rate 0.
#[derive(Debug, Default)]
pub struct RateMonitor {
    inner: Mutex<RateInner>,
}

impl RateMonitor {
    /// Creates a monitor with no baseline; the first snapshot establishes it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one occurrence of `key`. No failure mode.
    pub fn record(&self, key: &str) {
        let mut inner = self.inner.lock();
        if let Some(count) = inner.counts.get_mut(key) {
            *count += 1;
        } else {
            inner.counts.insert(Arc::from(key), 1);
        }
    }

    /// Returns events-per-second rates for every key recorded since the
    /// previous snapshot, then resets the accumulator and baseline.
    ///
    /// The first call after construction returns an empty map: with no
    /// baseline there is no interval to rate over.
    pub fn snapshot(&self) -> FxHashMap<Arc<str>, f64> {
        self.snapshot_at(Instant::now())
    }

    /// [`snapshot`](Self::snapshot) with an explicit clock reading, for
    /// deterministic scheduling and tests. A zero-length interval yields an
    /// empty map.
    pub fn snapshot_at(&self, now: Instant) -> FxHashMap<Arc<str>, f64> {
        let mut inner = self.inner.lock();

        let Some(last) = inner.last_snapshot_at.replace(now) else {
            inner.counts.clear();
            return FxHashMap::default();
        };

        let counts = std::mem::take(&mut inner.counts);
        let elapsed = now.saturating_duration_since(last).as_secs_f64();
        if elapsed <= 0.0 {
            return FxHashMap::default();
        }

        counts
            .into_iter()
            .map(|(key, count)| (key, count as f64 / elapsed))
            .collect()
    }
}
