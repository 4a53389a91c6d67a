//! Lifetime creation counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Cumulative counts of blobs produced, split by expected lifetime.
///
/// Young blobs are transient and never stored; survivor blobs are the ones fed
/// into a bounded store. Counters only ever increase.
#[derive(Debug, Default)]
pub struct CreationCounters {
    young: AtomicU64,
    survivor: AtomicU64,
}

impl CreationCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_young(&self) {
        self.young.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_survivor(&self) {
        self.survivor.fetch_add(1, Ordering::Relaxed);
    }

    pub fn young(&self) -> u64 {
        self.young.load(Ordering::Relaxed)
    }

    pub fn survivor(&self) -> u64 {
        self.survivor.load(Ordering::Relaxed)
    }

    /// Young-to-survivor ratio, with the divisor floored at 1
    pub fn ratio(&self) -> f64 {
        self.young() as f64 / self.survivor().max(1) as f64
    }
}
