//! Bounded in-memory blob stores
//!
//! Two size-capped stores of opaque byte blobs, safe to share between
//! concurrent request handlers:
//!
//! - [`AgeEvictingCache`]: keyed store with a byte budget. Admitting a blob
//!   that does not fit evicts the oldest entries first.
//! - [`RotationList`]: unkeyed sliding window that keeps only the most recent
//!   `max_elements` blobs.
//!
//! Both stores carry [`CreationCounters`] that record lifetime totals of
//! produced blobs and survive `clear()`.

mod blob;
mod cache;
mod counters;
mod rotation;
mod types;

pub use blob::Blob;
pub use cache::AgeEvictingCache;
pub use counters::CreationCounters;
pub use rotation::RotationList;
pub use types::{
    AdmitOutcome, CacheStats, OversizePolicy, ParsePolicyError, RotationStats, BYTES_PER_MB,
};
