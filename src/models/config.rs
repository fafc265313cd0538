//! Server configuration data model

use crate::defaults;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A named download size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeProfile {
    pub key: String,
    pub size_bytes: u64,
}

impl SizeProfile {
    pub fn new(key: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            key: key.into(),
            size_bytes,
        }
    }

    /// Size in MiB rounded to 2 decimals
    pub fn size_mb(&self) -> f64 {
        crate::stats::round2(self.size_bytes as f64 / defaults::MEBIBYTE as f64)
    }

    /// Label shown in the size picker, e.g. "50.0 MB"
    pub fn display_name(&self) -> String {
        let size_mb = self.size_mb();
        if size_mb.fract() == 0.0 {
            format!("{:.1} MB", size_mb)
        } else {
            format!("{} MB", size_mb)
        }
    }
}

/// A third-party website probed by the connectivity test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteTarget {
    pub key: String,
    pub name: String,
    pub url: String,
    pub description: String,
}

impl WebsiteTarget {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            url: url.into(),
            description: description.into(),
        }
    }
}

/// Process-wide configuration, built once at startup and shared read-only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to listen on
    pub host: String,

    /// TCP port to listen on
    pub port: u16,

    /// Download sizes in presentation order
    pub file_sizes: Vec<SizeProfile>,

    /// Key used when `size` is missing or unknown
    pub default_size_key: String,

    /// Maximum bytes per generated chunk
    pub chunk_size: usize,

    /// Number of samples taken by the latency test
    pub latency_test_count: u32,

    /// Packet size generated per latency sample
    pub latency_test_size: usize,

    /// Per-website probe timeout
    #[serde(with = "duration_secs")]
    pub probe_timeout: Duration,

    /// Upper bound on probes in flight during one website test
    pub max_concurrent_probes: usize,

    /// Probe targets in presentation order
    pub websites: Vec<WebsiteTarget>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::DEFAULT_HOST.to_string(),
            port: defaults::DEFAULT_PORT,
            file_sizes: defaults::DEFAULT_FILE_SIZES
                .iter()
                .map(|(key, bytes)| SizeProfile::new(*key, *bytes))
                .collect(),
            default_size_key: defaults::DEFAULT_SIZE_KEY.to_string(),
            chunk_size: defaults::DEFAULT_CHUNK_SIZE,
            latency_test_count: defaults::DEFAULT_LATENCY_TEST_COUNT,
            latency_test_size: defaults::DEFAULT_LATENCY_TEST_SIZE,
            probe_timeout: defaults::DEFAULT_PROBE_TIMEOUT,
            max_concurrent_probes: defaults::DEFAULT_MAX_CONCURRENT_PROBES,
            websites: defaults::DEFAULT_WEBSITES
                .iter()
                .map(|(key, name, url, description)| WebsiteTarget::new(*key, *name, *url, *description))
                .collect(),
        }
    }
}

impl ServerConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Socket address string to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Look up a size profile by key
    pub fn size_profile(&self, key: &str) -> Option<&SizeProfile> {
        self.file_sizes.iter().find(|profile| profile.key == key)
    }

    /// The profile for the default key
    pub fn default_size_profile(&self) -> Option<&SizeProfile> {
        self.size_profile(&self.default_size_key)
    }

    /// Resolve a requested key, silently falling back to the default.
    ///
    /// Returns `None` only if the default key itself is missing, which
    /// startup validation rules out.
    pub fn resolve_size(&self, requested: Option<&str>) -> Option<&SizeProfile> {
        requested
            .and_then(|key| self.size_profile(key))
            .or_else(|| self.default_size_profile())
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.bind_address(), "0.0.0.0:5000");

        let keys: Vec<&str> = config.file_sizes.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["1m", "10m", "50m", "100m"]);
        assert_eq!(config.default_size_profile().unwrap().size_bytes, 50 * 1024 * 1024);

        assert_eq!(config.chunk_size, 64 * 1024);
        assert_eq!(config.latency_test_count, 5);
        assert_eq!(config.probe_timeout, Duration::from_secs(10));
        assert_eq!(config.websites.len(), 6);
    }

    #[test]
    fn test_resolve_size_fallback() {
        let config = ServerConfig::default();
        assert_eq!(config.resolve_size(Some("10m")).unwrap().key, "10m");
        assert_eq!(config.resolve_size(Some("unknown")).unwrap().key, "50m");
        assert_eq!(config.resolve_size(None).unwrap().key, "50m");
    }

    #[test]
    fn test_size_profile_display() {
        let profile = SizeProfile::new("1m", 1024 * 1024);
        assert_eq!(profile.size_mb(), 1.0);
        assert_eq!(profile.display_name(), "1.0 MB");

        let odd = SizeProfile::new("odd", 1_500_000);
        assert_eq!(odd.size_mb(), 1.43);
        assert_eq!(odd.display_name(), "1.43 MB");
    }

    #[test]
    fn test_config_serialization() {
        let config = ServerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.probe_timeout, config.probe_timeout);
        assert_eq!(parsed.websites, config.websites);
    }
}
