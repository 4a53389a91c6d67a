use crate::error::{GcDemoError, Result};
use blob_store::{OversizePolicy, BYTES_PER_MB};
use std::env;

/// Service configuration parsed from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub app_name: String,
    /// Size of every allocated chunk
    pub chunk_size_mb: u64,
    /// Byte budget of the long-lived cache, in megabytes
    pub max_cache_mb: u64,
    /// Number of survivor chunks kept by the rotation list
    pub max_survivors: usize,
    pub oversize_policy: OversizePolicy,
    /// Upper bound for a single sustained-load request
    pub max_sustained_secs: u64,
    /// Upper bound for the megabytes a single burst, mixed or natural
    /// request may allocate
    pub max_request_mb: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            app_name: "gc-demo".to_string(),
            chunk_size_mb: 10,
            max_cache_mb: 200,
            max_survivors: 20,
            oversize_policy: OversizePolicy::AdmitAlways,
            max_sustained_secs: 300,
            max_request_mb: 1024,
        }
    }
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let port = lookup("PORT")
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let app_name = lookup("APP_NAME").unwrap_or(defaults.app_name);

        let chunk_size_mb = lookup("CHUNK_SIZE_MB")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.chunk_size_mb);
        if chunk_size_mb == 0 {
            return Err(GcDemoError::Config(
                "CHUNK_SIZE_MB must be positive".to_string(),
            ));
        }
        let chunk_bytes = mb_to_bytes("CHUNK_SIZE_MB", chunk_size_mb)?;
        if usize::try_from(chunk_bytes).is_err() {
            return Err(GcDemoError::Config(format!(
                "CHUNK_SIZE_MB={} does not fit in memory on this platform",
                chunk_size_mb
            )));
        }

        let max_cache_mb = lookup("MAX_CACHE_MB")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.max_cache_mb);
        mb_to_bytes("MAX_CACHE_MB", max_cache_mb)?;

        let max_survivors = lookup("MAX_SURVIVORS")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.max_survivors);

        let oversize_policy = match lookup("OVERSIZE_POLICY") {
            Some(s) => s.parse()?,
            None => defaults.oversize_policy,
        };

        let max_sustained_secs = lookup("MAX_SUSTAINED_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.max_sustained_secs);

        let max_request_mb = lookup("MAX_REQUEST_MB")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.max_request_mb);

        Ok(Self {
            port,
            app_name,
            chunk_size_mb,
            max_cache_mb,
            max_survivors,
            oversize_policy,
            max_sustained_secs,
            max_request_mb,
        })
    }

    pub fn chunk_bytes(&self) -> usize {
        usize::try_from(self.chunk_size_mb.saturating_mul(BYTES_PER_MB)).unwrap_or(usize::MAX)
    }

    pub fn max_cache_bytes(&self) -> u64 {
        self.max_cache_mb.saturating_mul(BYTES_PER_MB)
    }
}

fn mb_to_bytes(name: &str, mb: u64) -> Result<u64> {
    mb.checked_mul(BYTES_PER_MB)
        .ok_or_else(|| GcDemoError::Config(format!("{}={} overflows a byte count", name, mb)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.chunk_size_mb, 10);
        assert_eq!(config.max_cache_mb, 200);
        assert_eq!(config.max_survivors, 20);
        assert_eq!(config.oversize_policy, OversizePolicy::AdmitAlways);
        assert_eq!(config.chunk_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.max_cache_bytes(), 200 * 1024 * 1024);
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        assert_eq!(from_pairs(&[]).unwrap(), Config::default());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("PORT", "8080"),
            ("APP_NAME", "gc-demo-gen"),
            ("CHUNK_SIZE_MB", "5"),
            ("MAX_CACHE_MB", "400"),
            ("MAX_SURVIVORS", "40"),
            ("OVERSIZE_POLICY", "reject"),
            ("MAX_SUSTAINED_SECS", "60"),
            ("MAX_REQUEST_MB", "2048"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.app_name, "gc-demo-gen");
        assert_eq!(config.chunk_size_mb, 5);
        assert_eq!(config.max_cache_mb, 400);
        assert_eq!(config.max_survivors, 40);
        assert_eq!(config.oversize_policy, OversizePolicy::Reject);
        assert_eq!(config.max_sustained_secs, 60);
        assert_eq!(config.max_request_mb, 2048);
    }

    #[test]
    fn test_unparseable_numbers_fall_back_to_defaults() {
        let config = from_pairs(&[("PORT", "not-a-port"), ("MAX_SURVIVORS", "-3")]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_survivors, 20);
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let err = from_pairs(&[("CHUNK_SIZE_MB", "0")]).unwrap_err();
        assert!(err.to_string().contains("CHUNK_SIZE_MB"));
    }

    #[test]
    fn test_huge_chunk_size_is_rejected() {
        let err = from_pairs(&[("CHUNK_SIZE_MB", "18446744073709")]).unwrap_err();
        assert!(matches!(err, GcDemoError::Config(ref msg) if msg.contains("CHUNK_SIZE_MB")));
    }

    #[test]
    fn test_huge_cache_size_is_rejected() {
        let err = from_pairs(&[("MAX_CACHE_MB", "18446744073709")]).unwrap_err();
        assert!(matches!(err, GcDemoError::Config(ref msg) if msg.contains("MAX_CACHE_MB")));
    }

    #[test]
    fn test_largest_valid_cache_size_is_accepted() {
        let max_mb = u64::MAX / BYTES_PER_MB;
        let value = max_mb.to_string();
        let config = from_pairs(&[("MAX_CACHE_MB", value.as_str())]).unwrap();
        assert_eq!(config.max_cache_bytes(), max_mb * BYTES_PER_MB);
    }

    #[test]
    fn test_byte_helpers_saturate_instead_of_panicking() {
        let config = Config {
            chunk_size_mb: u64::MAX,
            max_cache_mb: u64::MAX,
            ..Config::default()
        };
        assert_eq!(config.max_cache_bytes(), u64::MAX);
        assert_eq!(config.chunk_bytes(), usize::MAX);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let err = from_pairs(&[("OVERSIZE_POLICY", "lru")]).unwrap_err();
        assert!(matches!(err, GcDemoError::Config(_)));
    }
}
