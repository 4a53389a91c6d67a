//! Store types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// What an [`AgeEvictingCache`](crate::AgeEvictingCache) does with a blob
/// larger than its whole byte budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OversizePolicy {
    /// Evict everything and admit the blob anyway
    #[default]
    AdmitAlways,
    /// Leave the store untouched and refuse the blob
    Reject,
}

impl fmt::Display for OversizePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OversizePolicy::AdmitAlways => write!(f, "admit-always"),
            OversizePolicy::Reject => write!(f, "reject"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePolicyError(String);

impl fmt::Display for ParsePolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown oversize policy '{}' (expected 'admit' or 'reject')",
            self.0
        )
    }
}

impl std::error::Error for ParsePolicyError {}

impl FromStr for OversizePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admit" | "admit-always" | "admit_always" => Ok(OversizePolicy::AdmitAlways),
            "reject" => Ok(OversizePolicy::Reject),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// Result of offering a blob to an [`AgeEvictingCache`](crate::AgeEvictingCache)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmitOutcome {
    Admitted {
        key: String,
        /// Keys evicted to make room, oldest first
        evicted: Vec<String>,
        /// Whether a live entry under the same key was replaced
        replaced: bool,
    },
    Rejected {
        size: u64,
        max_bytes: u64,
    },
}

impl AdmitOutcome {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmitOutcome::Admitted { .. })
    }

    pub fn evicted(&self) -> &[String] {
        match self {
            AdmitOutcome::Admitted { evicted, .. } => evicted,
            AdmitOutcome::Rejected { .. } => &[],
        }
    }
}

/// Point-in-time statistics for an age-evicting cache.
///
/// Fields are read independently and may come from slightly different
/// instants while writers are active.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub count: usize,
    pub occupied_bytes: u64,
    pub max_bytes: u64,
    pub young_created: u64,
    pub survivor_created: u64,
    pub ratio: f64,
}

/// Point-in-time statistics for a rotation list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationStats {
    pub count: usize,
    pub occupied_bytes: u64,
    pub max_elements: usize,
    pub element_size: u64,
    pub young_created: u64,
    pub survivor_created: u64,
    pub ratio: f64,
}
