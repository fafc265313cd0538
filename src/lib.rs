//! Speed Test Server
//!
//! An HTTP diagnostic service that streams synthetic random payloads for
//! download-speed measurement, reports local response latency, and probes
//! the reachability of a fixed set of third-party websites.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod probe;
pub mod server;
pub mod stats;
pub mod stream;

// Re-export commonly used types
pub use config::{ServerConfig, SizeProfile, WebsiteTarget};
pub use error::{AppError, Result};
pub use models::{ConnectivityResult, ConnectivitySummary, LatencyStatistics};
pub use server::{build_router, AppState};
pub use stats::calculate_latency_stats;
pub use stream::RandomStreamGenerator;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 5000;

    pub const MEBIBYTE: u64 = 1024 * 1024;
    pub const DEFAULT_SIZE_KEY: &str = "50m";
    /// Download size table: (key, bytes)
    pub const DEFAULT_FILE_SIZES: &[(&str, u64)] = &[
        ("1m", MEBIBYTE),          // quick
        ("10m", 10 * MEBIBYTE),    // standard
        ("50m", 50 * MEBIBYTE),    // detailed
        ("100m", 100 * MEBIBYTE),  // stress
    ];

    /// 64 KiB keeps memory flat while streaming large payloads
    pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

    pub const DEFAULT_LATENCY_TEST_COUNT: u32 = 5;
    pub const DEFAULT_LATENCY_TEST_SIZE: usize = 1024;

    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_MAX_CONCURRENT_PROBES: usize = 3;
    pub const DEFAULT_MAX_REDIRECTS: usize = 10;

    /// Probe targets: (key, display name, url, description)
    pub const DEFAULT_WEBSITES: &[(&str, &str, &str, &str)] = &[
        ("google", "Google", "https://www.google.com", "Global search engine"),
        ("github", "GitHub", "https://github.com", "Code hosting platform"),
        ("baidu", "Baidu", "https://www.baidu.com", "Chinese search engine"),
        ("bing", "Bing", "https://www.bing.com", "Microsoft search engine"),
        ("cloudflare", "Cloudflare", "https://www.cloudflare.com", "CDN and edge network"),
        ("wikipedia", "Wikipedia", "https://www.wikipedia.org", "Online encyclopedia"),
    ];
}
