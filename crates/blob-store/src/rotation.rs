//! Fixed-size sliding window of recently appended blobs

use crate::blob::Blob;
use crate::counters::CreationCounters;
use crate::types::RotationStats;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// An ordered list of same-sized blobs capped at `max_elements`.
///
/// Index 0 is always the oldest survivor. A batch append and the truncation
/// that follows it happen under one lock, so concurrent appends never leave
/// the list over its cap or interleave a batch.
pub struct RotationList {
    items: Mutex<VecDeque<Blob>>,
    max_elements: usize,
    /// Size every element is expected to have
    element_size: u64,
    /// Mirror of `items.len()` for lock-free stats
    count: AtomicUsize,
    counters: CreationCounters,
}

impl RotationList {
    pub fn new(max_elements: usize, element_size: u64) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(max_elements)),
            max_elements,
            element_size,
            count: AtomicUsize::new(0),
            counters: CreationCounters::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Blob>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `blobs` in order, then drop the oldest elements beyond the cap.
    ///
    /// Returns how many elements were dropped.
    pub fn append(&self, blobs: Vec<Blob>) -> usize {
        if blobs.is_empty() {
            return 0;
        }

        debug_assert!(
            blobs.iter().all(|b| b.len() as u64 == self.element_size),
            "rotation list elements must be {} bytes",
            self.element_size
        );

        let dropped = {
            let mut items = self.lock();
            items.extend(blobs);
            let excess = items.len().saturating_sub(self.max_elements);
            let dropped: Vec<Blob> = items.drain(..excess).collect();
            self.count.store(items.len(), Ordering::Relaxed);
            dropped
        };

        if !dropped.is_empty() {
            debug!(
                dropped = dropped.len(),
                max_elements = self.max_elements,
                "Rotated out oldest survivors"
            );
        }
        dropped.len()
    }

    /// Remove every element. Creation counters are left untouched.
    pub fn clear(&self) {
        let items = {
            let mut items = self.lock();
            self.count.store(0, Ordering::Relaxed);
            std::mem::take(&mut *items)
        };

        if !items.is_empty() {
            info!(entries = items.len(), "Cleared survivors");
        }
    }

    /// Map `f` over the retained blobs, oldest first
    pub fn inspect<T>(&self, f: impl FnMut(&Blob) -> T) -> Vec<T> {
        self.lock().iter().map(f).collect()
    }

    pub fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_elements(&self) -> usize {
        self.max_elements
    }

    pub fn element_size(&self) -> u64 {
        self.element_size
    }

    pub fn counters(&self) -> &CreationCounters {
        &self.counters
    }

    pub fn stats(&self) -> RotationStats {
        let count = self.len();
        RotationStats {
            count,
            occupied_bytes: count as u64 * self.element_size,
            max_elements: self.max_elements,
            element_size: self.element_size,
            young_created: self.counters.young(),
            survivor_created: self.counters.survivor(),
            ratio: self.counters.ratio(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Blobs tagged with their sequence number in the first byte
    fn tagged(range: std::ops::RangeInclusive<u8>) -> Vec<Blob> {
        range.map(|i| Blob::new(vec![i; 4])).collect()
    }

    fn tags(list: &RotationList) -> Vec<u8> {
        list.inspect(|b| b.as_bytes()[0])
    }

    #[test]
    fn test_append_within_cap() {
        let list = RotationList::new(20, 4);
        assert_eq!(list.append(tagged(1..=5)), 0);
        assert_eq!(tags(&list), vec![1, 2, 3, 4, 5]);
        assert_eq!(list.len(), 5);
    }

    #[test]
    fn test_sequential_appends_keep_most_recent() {
        let list = RotationList::new(20, 4);
        let mut dropped = 0;
        for i in 1..=25 {
            dropped += list.append(tagged(i..=i));
        }

        assert_eq!(dropped, 5);
        assert_eq!(list.len(), 20);
        assert_eq!(tags(&list), (6..=25).collect::<Vec<u8>>());
    }

    #[test]
    fn test_single_batch_larger_than_cap() {
        let list = RotationList::new(3, 4);
        list.append(tagged(1..=2));
        assert_eq!(list.append(tagged(3..=7)), 4);
        assert_eq!(tags(&list), vec![5, 6, 7]);
    }

    #[test]
    fn test_zero_cap_retains_nothing() {
        let list = RotationList::new(0, 4);
        assert_eq!(list.append(tagged(1..=3)), 3);
        assert!(list.is_empty());
    }

    #[test]
    fn test_empty_append_is_noop() {
        let list = RotationList::new(2, 4);
        list.append(tagged(1..=2));
        assert_eq!(list.append(Vec::new()), 0);
        assert_eq!(tags(&list), vec![1, 2]);
    }

    #[test]
    fn test_stats_derive_bytes_from_count() {
        let list = RotationList::new(20, 4);
        list.counters().record_young();
        list.counters().record_young();
        list.counters().record_survivor();
        list.append(tagged(1..=3));

        let stats = list.stats();
        assert_eq!(
            stats,
            RotationStats {
                count: 3,
                occupied_bytes: 12,
                max_elements: 20,
                element_size: 4,
                young_created: 2,
                survivor_created: 1,
                ratio: 2.0,
            }
        );
    }

    #[test]
    fn test_clear_keeps_counters_and_is_idempotent() {
        let list = RotationList::new(20, 4);
        list.counters().record_survivor();
        list.append(tagged(1..=3));

        list.clear();
        list.clear();

        let stats = list.stats();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.occupied_bytes, 0);
        assert_eq!(stats.survivor_created, 1);
        assert!(tags(&list).is_empty());
    }

    #[test]
    fn test_concurrent_appends_never_exceed_cap_or_split_batches() {
        let list = RotationList::new(20, 4);

        std::thread::scope(|s| {
            for t in 0..8u8 {
                let list = &list;
                s.spawn(move || {
                    for _ in 0..100 {
                        // Each batch is three copies of the thread tag
                        list.append((0..3).map(|_| Blob::new(vec![t; 4])).collect());
                        assert!(list.len() <= 20);
                    }
                });
            }
        });

        let retained = tags(&list);
        assert_eq!(retained.len(), 20);
        assert_eq!(list.len(), 20);

        // 20 = 3 * 6 + 2: the front holds the tail of one batch, the
        // remaining elements are whole batches
        for batch in retained[2..].chunks(3) {
            assert!(batch.iter().all(|t| *t == batch[0]));
        }
    }
}
