//! Allocation workloads that feed the bounded stores
//!
//! Every workload produces fixed-size random chunks. Young chunks are held
//! only until the call returns; survivor chunks are handed to a store.

use crate::error::Result;
use crate::types::AllocationResult;
use blob_store::{AgeEvictingCache, Blob, CreationCounters, RotationList, BYTES_PER_MB};
use std::time::{Duration, Instant};
use tracing::debug;

/// Produces chunks of a configured size
#[derive(Debug, Clone, Copy)]
pub struct Allocator {
    chunk_size_mb: u64,
}

impl Allocator {
    pub fn new(chunk_size_mb: u64) -> Self {
        Self { chunk_size_mb }
    }

    pub fn chunk_bytes(&self) -> usize {
        usize::try_from(self.chunk_size_mb.saturating_mul(BYTES_PER_MB)).unwrap_or(usize::MAX)
    }

    /// Number of whole chunks in `mb` megabytes; zero for non-positive sizes
    pub fn chunks_for(&self, mb: i64) -> usize {
        if mb <= 0 || self.chunk_size_mb == 0 {
            return 0;
        }
        (mb as u64 / self.chunk_size_mb) as usize
    }

    fn chunk(&self) -> Blob {
        Blob::random(self.chunk_bytes())
    }

    /// Allocate `count` chunks that all become garbage on return
    pub fn allocate_and_discard(&self, count: i64) -> AllocationResult {
        let start = Instant::now();
        let count = count.max(0) as usize;

        let garbage: Vec<Blob> = (0..count).map(|_| self.chunk()).collect();
        let total_bytes: u64 = garbage.iter().map(|b| b.len() as u64).sum();
        drop(garbage);

        AllocationResult {
            object_count: count,
            total_bytes,
            duration: start.elapsed(),
            young_objects: count,
            survivor_objects: 0,
        }
    }

    /// Allocate one chunk every `1000 / rate` ms for `duration_secs` seconds,
    /// capped at `max_secs`.
    pub async fn sustained_load(
        &self,
        duration_secs: i64,
        rate: i64,
        max_secs: u64,
    ) -> Result<AllocationResult> {
        let start = Instant::now();
        if duration_secs <= 0 || rate <= 0 {
            return Ok(AllocationResult::default());
        }

        let run_for = Duration::from_secs((duration_secs as u64).min(max_secs));
        let interval = Duration::from_millis(1000 / rate as u64);
        let allocator = *self;
        let mut result = AllocationResult::default();

        while start.elapsed() < run_for {
            let size = tokio::task::spawn_blocking(move || allocator.chunk().len()).await?;
            result.total_bytes += size as u64;
            result.object_count += 1;
            result.young_objects += 1;
            tokio::time::sleep(interval).await;
        }

        result.duration = start.elapsed();
        debug!(
            objects = result.object_count,
            duration_ms = result.duration_ms(),
            "Sustained load finished"
        );
        Ok(result)
    }

    /// Short-lived chunks die on return; long-lived chunks go into `cache`,
    /// evicting its oldest entries when the byte budget is exceeded.
    pub fn mixed_workload(
        &self,
        cache: &AgeEvictingCache,
        short_lived_mb: i64,
        long_lived_mb: i64,
    ) -> AllocationResult {
        let start = Instant::now();

        let young_count = self.chunks_for(short_lived_mb);
        let young = self.produce_young(young_count, cache.counters());
        let mut total_bytes: u64 = young.iter().map(|b| b.len() as u64).sum();

        let long_lived_count = self.chunks_for(long_lived_mb);
        let mut evicted = 0;
        for _ in 0..long_lived_count {
            let chunk = self.chunk();
            cache.counters().record_survivor();
            total_bytes += chunk.len() as u64;
            evicted += cache.admit(chunk).evicted().len();
        }
        drop(young);

        debug!(
            young = young_count,
            long_lived = long_lived_count,
            evicted,
            "Mixed workload finished"
        );

        AllocationResult {
            object_count: young_count + long_lived_count,
            total_bytes,
            duration: start.elapsed(),
            young_objects: young_count,
            survivor_objects: long_lived_count,
        }
    }

    /// Short-lived chunks die on return; survivors are appended as one batch
    /// to `survivors`, which keeps only its most recent elements.
    pub fn natural_generational_workload(
        &self,
        survivors: &RotationList,
        short_lived_mb: i64,
        survivors_mb: i64,
    ) -> AllocationResult {
        let start = Instant::now();

        let young_count = self.chunks_for(short_lived_mb);
        let young = self.produce_young(young_count, survivors.counters());
        let mut total_bytes: u64 = young.iter().map(|b| b.len() as u64).sum();

        let survivor_count = self.chunks_for(survivors_mb);
        let batch: Vec<Blob> = (0..survivor_count)
            .map(|_| {
                let chunk = self.chunk();
                survivors.counters().record_survivor();
                chunk
            })
            .collect();
        total_bytes += batch.iter().map(|b| b.len() as u64).sum::<u64>();

        let dropped = survivors.append(batch);
        drop(young);

        debug!(
            young = young_count,
            survivors = survivor_count,
            dropped,
            "Natural generational workload finished"
        );

        AllocationResult {
            object_count: young_count + survivor_count,
            total_bytes,
            duration: start.elapsed(),
            young_objects: young_count,
            survivor_objects: survivor_count,
        }
    }

    fn produce_young(&self, count: usize, counters: &CreationCounters) -> Vec<Blob> {
        (0..count)
            .map(|_| {
                let chunk = self.chunk();
                counters.record_young();
                chunk
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blob_store::OversizePolicy;

    const MB: u64 = BYTES_PER_MB;

    #[test]
    fn test_chunks_for() {
        let allocator = Allocator::new(10);
        assert_eq!(allocator.chunks_for(80), 8);
        assert_eq!(allocator.chunks_for(25), 2);
        assert_eq!(allocator.chunks_for(9), 0);
        assert_eq!(allocator.chunks_for(0), 0);
        assert_eq!(allocator.chunks_for(-20), 0);
    }

    #[test]
    fn test_allocate_and_discard() {
        let allocator = Allocator::new(1);
        let result = allocator.allocate_and_discard(3);
        assert_eq!(result.object_count, 3);
        assert_eq!(result.total_bytes, 3 * MB);
        assert_eq!(result.young_objects, 3);
        assert_eq!(result.survivor_objects, 0);
    }

    #[test]
    fn test_allocate_negative_count_is_noop() {
        let result = Allocator::new(1).allocate_and_discard(-5);
        assert_eq!(result.object_count, 0);
        assert_eq!(result.total_bytes, 0);
    }

    #[test]
    fn test_mixed_workload_fills_cache_and_counts() {
        let allocator = Allocator::new(1);
        let cache = AgeEvictingCache::new(3 * MB, OversizePolicy::AdmitAlways);

        let result = allocator.mixed_workload(&cache, 4, 3);
        assert_eq!(result.young_objects, 4);
        assert_eq!(result.survivor_objects, 3);
        assert_eq!(result.object_count, 7);
        assert_eq!(result.total_bytes, 7 * MB);

        let stats = cache.stats();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.occupied_bytes, 3 * MB);
        assert_eq!(stats.young_created, 4);
        assert_eq!(stats.survivor_created, 3);
    }

    #[test]
    fn test_mixed_workload_evicts_oldest() {
        let allocator = Allocator::new(1);
        let cache = AgeEvictingCache::new(3 * MB, OversizePolicy::AdmitAlways);

        allocator.mixed_workload(&cache, 0, 3);
        allocator.mixed_workload(&cache, 0, 1);

        assert_eq!(cache.keys_by_age(), ["obj_2", "obj_3", "obj_4"]);
        assert_eq!(cache.occupied_bytes(), 3 * MB);
        assert_eq!(cache.counters().survivor(), 4);
    }

    #[test]
    fn test_natural_workload_rotates_survivors() {
        let allocator = Allocator::new(1);
        let survivors = RotationList::new(4, MB);

        let result = allocator.natural_generational_workload(&survivors, 2, 3);
        assert_eq!(result.young_objects, 2);
        assert_eq!(result.survivor_objects, 3);
        assert_eq!(survivors.len(), 3);

        allocator.natural_generational_workload(&survivors, 2, 3);
        let stats = survivors.stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.occupied_bytes, 4 * MB);
        assert_eq!(stats.young_created, 4);
        assert_eq!(stats.survivor_created, 6);
    }

    #[test]
    fn test_natural_workload_zero_sizes_are_noop() {
        let allocator = Allocator::new(1);
        let survivors = RotationList::new(4, MB);

        let result = allocator.natural_generational_workload(&survivors, 0, -10);
        assert_eq!(result, AllocationResult { duration: result.duration, ..Default::default() });
        assert!(survivors.is_empty());
        assert_eq!(survivors.counters().young(), 0);
    }

    #[tokio::test]
    async fn test_sustained_load_invalid_rate_is_noop() {
        let allocator = Allocator::new(1);
        let result = allocator.sustained_load(5, 0, 300).await.unwrap();
        assert_eq!(result.object_count, 0);

        let result = allocator.sustained_load(-1, 5, 300).await.unwrap();
        assert_eq!(result.object_count, 0);
    }

    #[tokio::test]
    async fn test_sustained_load_respects_cap() {
        let allocator = Allocator::new(1);
        // Requested 60s, capped to 1s at 10 chunks/s
        let result = allocator.sustained_load(60, 10, 1).await.unwrap();
        assert!(result.object_count >= 1);
        assert!(result.object_count <= 11);
        assert!(result.duration < Duration::from_secs(5));
        assert_eq!(result.total_bytes, result.object_count as u64 * MB);
    }
}
