//! Operation counters and memory accounting exposed via `GetStats`.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic operation counters for a database.
///
/// Counters are independent atomics rather than a single lock-guarded
/// struct: each increments under its own short-lived borrow, so a reader
/// calling `snapshot()` may observe counts from slightly different
/// instants relative to each other. `GetStats()` is documented as
/// eventually consistent for exactly this reason.
#[derive(Debug, Default)]
pub struct Stats {
    inserts: AtomicU64,
    deletes: AtomicU64,
    searches: AtomicU64,
    insert_errors: AtomicU64,
    search_errors: AtomicU64,
    delete_errors: AtomicU64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_insert_error(&self) {
        self.insert_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delete_error(&self) {
        self.delete_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_search(&self) {
        self.searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_search_error(&self) {
        self.search_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a consistent-enough point-in-time copy of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            inserts: self.inserts.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            searches: self.searches.load(Ordering::Relaxed),
            insert_errors: self.insert_errors.load(Ordering::Relaxed),
            search_errors: self.search_errors.load(Ordering::Relaxed),
            delete_errors: self.delete_errors.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`Stats`]'s counters, plus derived index
/// metrics, as returned by `GetStats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub inserts: u64,
    pub deletes: u64,
    pub searches: u64,
    pub insert_errors: u64,
    pub search_errors: u64,
    pub delete_errors: u64,
}

/// Estimates the resident memory footprint of an index holding `count`
/// vectors of `dimensions` floats each.
///
/// `N*D*4` for the raw vector data, `N*100` for per-node bookkeeping
/// (neighbor lists, ids, level), and half that again for graph overhead
/// across the upper layers.
pub fn estimate_memory_bytes(count: usize, dimensions: usize) -> u64 {
    let vectors = (count * dimensions * 4) as u64;
    let bookkeeping = (count * 100) as u64;
    vectors + bookkeeping + (vectors / 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let s = Stats::new();
        let snap = s.snapshot();
        assert_eq!(snap.inserts, 0);
        assert_eq!(snap.searches, 0);
    }

    #[test]
    fn counters_increment_independently() {
        let s = Stats::new();
        s.record_insert();
        s.record_insert();
        s.record_search();
        s.record_search_error();
        let snap = s.snapshot();
        assert_eq!(snap.inserts, 2);
        assert_eq!(snap.searches, 1);
        assert_eq!(snap.search_errors, 1);
        assert_eq!(snap.deletes, 0);
    }

    #[test]
    fn memory_estimate_scales_with_count_and_dimension() {
        let small = estimate_memory_bytes(10, 128);
        let large = estimate_memory_bytes(100, 128);
        assert!(large > small * 5);
    }
}
