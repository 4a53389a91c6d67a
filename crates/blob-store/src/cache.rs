//! Keyed blob cache with a byte budget and oldest-first eviction

use crate::blob::Blob;
use crate::counters::CreationCounters;
use crate::types::{AdmitOutcome, CacheStats, OversizePolicy};
use chrono::{DateTime, SubsecRound, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// A live cache entry
struct CacheEntry {
    blob: Blob,
    seq: u64,
    created_at: DateTime<Utc>,
}

impl CacheEntry {
    fn age_key(&self) -> (DateTime<Utc>, u64) {
        (self.created_at, self.seq)
    }
}

/// State guarded by the cache mutex
#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Keys ordered by (creation time, insertion ordinal)
    by_age: BTreeMap<(DateTime<Utc>, u64), String>,
    next_seq: u64,
    /// Last number handed out for a generated `obj_<n>` key
    last_key: u64,
    last_created: Option<DateTime<Utc>>,
}

impl CacheInner {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.by_age.remove(&entry.age_key());
        Some(entry)
    }

    fn pop_oldest(&mut self) -> Option<(String, CacheEntry)> {
        let (_, key) = self.by_age.pop_first()?;
        let entry = self.entries.remove(&key)?;
        Some((key, entry))
    }

    /// Next `obj_<n>` key not currently held by a caller-supplied entry
    fn next_key(&mut self) -> String {
        loop {
            self.last_key += 1;
            let key = format!("obj_{}", self.last_key);
            if !self.entries.contains_key(&key) {
                return key;
            }
        }
    }

    /// Millisecond timestamp that never goes below the previous one
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now().trunc_subsecs(3);
        let created_at = match self.last_created {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_created = Some(created_at);
        created_at
    }
}

/// A size-capped store of blobs that evicts the oldest entries on overflow.
///
/// All mutation happens under a single mutex. The entry count and occupied
/// bytes are mirrored into atomics so [`stats`](Self::stats) never takes that
/// mutex; a stats reader may see count and bytes from different instants.
pub struct AgeEvictingCache {
    /// Entries and their age index
    inner: Mutex<CacheInner>,
    /// Maximum total bytes held
    max_bytes: u64,
    /// Treatment of blobs larger than `max_bytes`
    policy: OversizePolicy,
    /// Sum of live blob lengths
    occupied: AtomicU64,
    /// Number of live entries
    count: AtomicUsize,
    counters: CreationCounters,
}

impl AgeEvictingCache {
    pub fn new(max_bytes: u64, policy: OversizePolicy) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            max_bytes,
            policy,
            occupied: AtomicU64::new(0),
            count: AtomicUsize::new(0),
            counters: CreationCounters::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit a blob under a freshly generated `obj_<n>` key.
    ///
    /// Generated keys skip any `obj_<n>` a caller has supplied that is still
    /// live, so this never replaces an existing entry.
    pub fn admit(&self, blob: Blob) -> AdmitOutcome {
        self.admit_inner(None, blob)
    }

    /// Admit a blob under `key`, evicting the oldest entries until it fits.
    ///
    /// A live entry under the same key is replaced and its bytes released
    /// before the capacity check.
    pub fn admit_with_key(&self, key: impl Into<String>, blob: Blob) -> AdmitOutcome {
        self.admit_inner(Some(key.into()), blob)
    }

    fn admit_inner(&self, requested: Option<String>, blob: Blob) -> AdmitOutcome {
        let size = blob.len() as u64;

        if size > self.max_bytes && self.policy == OversizePolicy::Reject {
            debug!(key = ?requested, size, max_bytes = self.max_bytes, "Rejected oversized blob");
            return AdmitOutcome::Rejected {
                size,
                max_bytes: self.max_bytes,
            };
        }

        let mut released = Vec::new();
        let mut evicted = Vec::new();
        let replaced;
        let key;

        {
            let mut inner = self.lock();

            key = match requested {
                Some(key) => key,
                None => inner.next_key(),
            };

            replaced = match inner.remove(&key) {
                Some(previous) => {
                    self.release(&previous);
                    released.push(previous);
                    true
                }
                None => false,
            };

            self.evict_if_needed(&mut inner, size, &mut evicted, &mut released);

            let seq = inner.next_seq;
            inner.next_seq += 1;
            let created_at = inner.next_timestamp();
            let entry = CacheEntry {
                blob,
                seq,
                created_at,
            };
            inner.by_age.insert(entry.age_key(), key.clone());
            inner.entries.insert(key.clone(), entry);

            self.occupied.fetch_add(size, Ordering::Relaxed);
            self.count.fetch_add(1, Ordering::Relaxed);
        }

        // Evicted buffers are freed here, outside the lock
        drop(released);

        debug!(key = %key, size, evicted = evicted.len(), replaced, "Admitted blob");

        AdmitOutcome::Admitted {
            key,
            evicted,
            replaced,
        }
    }

    /// Evict oldest entries until there's enough room for `new_size` bytes
    fn evict_if_needed(
        &self,
        inner: &mut CacheInner,
        new_size: u64,
        evicted: &mut Vec<String>,
        released: &mut Vec<CacheEntry>,
    ) {
        while self.occupied.load(Ordering::Relaxed) + new_size > self.max_bytes {
            let Some((key, entry)) = inner.pop_oldest() else {
                break;
            };
            self.release(&entry);
            debug!(key = %key, size = entry.blob.len(), "Evicted oldest cache entry");
            evicted.push(key);
            released.push(entry);
        }
    }

    fn release(&self, entry: &CacheEntry) {
        self.occupied
            .fetch_sub(entry.blob.len() as u64, Ordering::Relaxed);
        self.count.fetch_sub(1, Ordering::Relaxed);
    }

    /// Remove every entry. Creation counters are left untouched.
    pub fn clear(&self) {
        let entries = {
            let mut inner = self.lock();
            let entries = std::mem::take(&mut inner.entries);
            inner.by_age.clear();
            self.occupied.store(0, Ordering::Relaxed);
            self.count.store(0, Ordering::Relaxed);
            entries
        };

        if !entries.is_empty() {
            info!(entries = entries.len(), "Cleared cache");
        }
    }

    pub fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn occupied_bytes(&self) -> u64 {
        self.occupied.load(Ordering::Relaxed)
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn policy(&self) -> OversizePolicy {
        self.policy
    }

    pub fn counters(&self) -> &CreationCounters {
        &self.counters
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Live keys, oldest first
    pub fn keys_by_age(&self) -> Vec<String> {
        self.lock().by_age.values().cloned().collect()
    }

    /// Get current cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            count: self.len(),
            occupied_bytes: self.occupied_bytes(),
            max_bytes: self.max_bytes,
            young_created: self.counters.young(),
            survivor_created: self.counters.survivor(),
            ratio: self.counters.ratio(),
        }
    }

    #[cfg(test)]
    fn live_bytes(&self) -> u64 {
        self.lock()
            .entries
            .values()
            .map(|e| e.blob.len() as u64)
            .sum()
    }
}
