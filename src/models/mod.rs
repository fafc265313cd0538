//! Data models and structures for the speed test server

pub mod config;
pub mod metrics;

// Re-export main model types
pub use config::{ServerConfig, SizeProfile, WebsiteTarget};
pub use metrics::{
    ConnectivityResult, ConnectivitySummary, LatencySampleDetail, LatencyStatistics,
};

/// Local wall-clock timestamp in ISO-8601 form, as reported in API payloads
pub fn iso_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Seconds since the Unix epoch with sub-second precision
pub fn unix_time_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
