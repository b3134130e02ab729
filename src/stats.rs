//! Delivery counters.
//!
//! Counters are updated with relaxed atomics by the dispatch loop and read as a
//! point-in-time [`StatsSnapshot`]; individual fields may be mutually skewed
//! by in-flight updates.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct Stats {
    dispatched: AtomicU64,
    delivered: AtomicU64,
    timed_out: AtomicU64,
    pruned: AtomicU64,
}

impl Stats {
    pub(crate) fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timed_out(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_pruned(&self, n: usize) {
        self.pruned.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            pruned: self.pruned.load(Ordering::Relaxed),
        }
    }
}

/// Counters observed at one point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Values taken from the intake queue by the dispatch loop.
    pub dispatched: u64,
    /// Successful per-subscriber deliveries.
    pub delivered: u64,
    /// Per-subscriber deliveries dropped because the delivery timeout elapsed.
    pub timed_out: u64,
    /// Subscribers removed after their receiving side was found closed.
    pub pruned: u64,
}
