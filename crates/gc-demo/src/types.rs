//! Request results and response bodies for the GC demo service

use blob_store::{CacheStats, OversizePolicy, RotationStats, BYTES_PER_MB};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of one workload invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationResult {
    pub object_count: usize,
    pub total_bytes: u64,
    pub duration: Duration,
    pub young_objects: usize,
    pub survivor_objects: usize,
}

impl AllocationResult {
    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }

    pub fn total_mb(&self) -> f64 {
        self.total_bytes as f64 / BYTES_PER_MB as f64
    }
}

/// Round to two decimals for display
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mb(bytes: u64) -> f64 {
    round2(bytes as f64 / BYTES_PER_MB as f64)
}

/// Sustained load query parameters
#[derive(Debug, Deserialize)]
pub struct SustainedQuery {
    #[serde(default = "default_duration")]
    pub duration: i64,
    #[serde(default = "default_rate")]
    pub rate: i64,
}

fn default_duration() -> i64 {
    10
}

fn default_rate() -> i64 {
    5
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResponse {
    pub status: &'static str,
    pub objects_allocated: usize,
    #[serde(rename = "totalMB")]
    pub total_mb: f64,
    pub duration_ms: f64,
}

impl From<&AllocationResult> for LoadResponse {
    fn from(result: &AllocationResult) -> Self {
        Self {
            status: "completed",
            objects_allocated: result.object_count,
            total_mb: round2(result.total_mb()),
            duration_ms: round2(result.duration_ms()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SustainedResponse {
    pub status: &'static str,
    pub duration_seconds: i64,
    pub objects_allocated: usize,
    #[serde(rename = "totalMB")]
    pub total_mb: f64,
    pub actual_duration_ms: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MixedResponse {
    pub status: &'static str,
    pub objects_allocated: usize,
    pub young_objects: usize,
    pub old_objects: usize,
    #[serde(rename = "totalMB")]
    pub total_mb: f64,
    pub duration_ms: f64,
}

impl From<&AllocationResult> for MixedResponse {
    fn from(result: &AllocationResult) -> Self {
        Self {
            status: "completed",
            objects_allocated: result.object_count,
            young_objects: result.young_objects,
            old_objects: result.survivor_objects,
            total_mb: round2(result.total_mb()),
            duration_ms: round2(result.duration_ms()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NaturalResponse {
    pub status: &'static str,
    pub objects_allocated: usize,
    pub young_objects: usize,
    pub survivor_objects: usize,
    #[serde(rename = "totalMB")]
    pub total_mb: f64,
    pub duration_ms: f64,
}

impl From<&AllocationResult> for NaturalResponse {
    fn from(result: &AllocationResult) -> Self {
        Self {
            status: "completed",
            objects_allocated: result.object_count,
            young_objects: result.young_objects,
            survivor_objects: result.survivor_objects,
            total_mb: round2(result.total_mb()),
            duration_ms: round2(result.duration_ms()),
        }
    }
}

/// Long-lived cache statistics as reported over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsResponse {
    pub cache_size: usize,
    #[serde(rename = "cachedMB")]
    pub cached_mb: f64,
    #[serde(rename = "maxCacheMB")]
    pub max_cache_mb: f64,
    pub young_objects_created: u64,
    pub old_objects_created: u64,
    pub young_to_old_ratio: f64,
    pub oversize_policy: OversizePolicy,
}

impl CacheStatsResponse {
    pub fn new(stats: &CacheStats, oversize_policy: OversizePolicy) -> Self {
        Self {
            cache_size: stats.count,
            cached_mb: mb(stats.occupied_bytes),
            max_cache_mb: mb(stats.max_bytes),
            young_objects_created: stats.young_created,
            old_objects_created: stats.survivor_created,
            young_to_old_ratio: round2(stats.ratio),
            oversize_policy,
        }
    }
}

/// Survivor rotation statistics as reported over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurvivorStatsResponse {
    pub survivor_count: usize,
    #[serde(rename = "survivorMB")]
    pub survivor_mb: f64,
    pub max_survivors: usize,
    pub young_objects_created: u64,
    pub survivor_objects_created: u64,
    pub young_to_survivor_ratio: f64,
}

impl From<&RotationStats> for SurvivorStatsResponse {
    fn from(stats: &RotationStats) -> Self {
        Self {
            survivor_count: stats.count,
            survivor_mb: mb(stats.occupied_bytes),
            max_survivors: stats.max_elements,
            young_objects_created: stats.young_created,
            survivor_objects_created: stats.survivor_created,
            young_to_survivor_ratio: round2(stats.ratio),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResponse<T> {
    pub status: &'static str,
    pub current_stats: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub application: String,
    pub version: &'static str,
    pub uptime_secs: u64,
    #[serde(rename = "chunkSizeMB")]
    pub chunk_size_mb: u64,
    #[serde(rename = "maxCacheMB")]
    pub max_cache_mb: u64,
    pub max_survivors: usize,
    pub oversize_policy: OversizePolicy,
    #[serde(rename = "maxRequestMB")]
    pub max_request_mb: u64,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub cache: CacheStats,
    pub survivors: RotationStats,
}
