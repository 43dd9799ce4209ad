//! Operation counters for the rank index.
//!
//! Enabled by the `metrics` feature. Counters are observational only and
//! never affect tracking semantics; they are read by copying a
//! [`RankMetricsSnapshot`] while the rank index lock is held.

use std::cell::Cell;

/// A metrics-only cell.
///
/// All accesses are externally synchronized: the cells live inside the rank
/// index state, behind its mutex.
#[repr(transparent)]
#[derive(Debug, Default)]
pub(crate) struct MetricsCell(Cell<u64>);

impl MetricsCell {
    #[inline]
    pub(crate) fn get(&self) -> u64 {
        self.0.get()
    }

    #[inline]
    pub(crate) fn incr(&self) {
        self.0.set(self.0.get() + 1);
    }

    #[inline]
    pub(crate) fn add(&self, n: u64) {
        self.0.set(self.0.get() + n);
    }
}

#[derive(Debug, Default)]
pub(crate) struct RankMetrics {
    pub(crate) increment_calls: MetricsCell,
    pub(crate) records_created: MetricsCell,
    pub(crate) reinserts: MetricsCell,
    pub(crate) top_n_calls: MetricsCell,
    pub(crate) top_n_rows: MetricsCell,
    pub(crate) prune_calls: MetricsCell,
    pub(crate) records_pruned: MetricsCell,
}

impl RankMetrics {
    pub(crate) fn snapshot(&self, tracked: usize) -> RankMetricsSnapshot {
        RankMetricsSnapshot {
            increment_calls: self.increment_calls.get(),
            records_created: self.records_created.get(),
            reinserts: self.reinserts.get(),
            top_n_calls: self.top_n_calls.get(),
            top_n_rows: self.top_n_rows.get(),
            prune_calls: self.prune_calls.get(),
            records_pruned: self.records_pruned.get(),
            tracked,
        }
    }
}

/// Point-in-time copy of the rank index operation counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct RankMetricsSnapshot {
    pub increment_calls: u64,
    pub records_created: u64,
    /// Retract/reinsert cycles performed for pre-existing records.
    pub reinserts: u64,

    pub top_n_calls: u64,
    pub top_n_rows: u64,

    pub prune_calls: u64,
    pub records_pruned: u64,

    // gauge captured at snapshot time
    pub tracked: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_increments_and_adds() {
        let cell = MetricsCell::default();
        cell.incr();
        cell.incr();
        cell.add(3);
        assert_eq!(cell.get(), 5);
    }

    #[test]
    fn snapshot_copies_counters() {
        let metrics = RankMetrics::default();
        metrics.increment_calls.add(4);
        metrics.records_pruned.incr();

        let snapshot = metrics.snapshot(2);
        assert_eq!(snapshot.increment_calls, 4);
        assert_eq!(snapshot.records_pruned, 1);
        assert_eq!(snapshot.tracked, 2);
    }
}
