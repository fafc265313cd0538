//! Configuration management module

pub mod validation;

// Re-export main functionality
pub use validation::{validate_config, ConfigValidator, ValidationLevel, ValidationWarning};

// Re-export from models for convenience
pub use crate::models::config::{ServerConfig, SizeProfile, WebsiteTarget};

/// Render a short human-readable summary of the active configuration
pub fn display_config_summary(config: &ServerConfig) -> String {
    let sizes: Vec<String> = config
        .file_sizes
        .iter()
        .map(|profile| profile.display_name())
        .collect();
    let default_size = config
        .default_size_profile()
        .map(|profile| profile.display_name())
        .unwrap_or_else(|| "-".to_string());

    let mut summary = String::new();
    summary.push_str(&format!("  Supported sizes: {}\n", sizes.join(", ")));
    summary.push_str(&format!("  Default size: {} ({})\n", default_size, config.default_size_key));
    summary.push_str(&format!("  Chunk size: {} KiB\n", config.chunk_size / 1024));
    summary.push_str(&format!(
        "  Latency test: {} x {} bytes\n",
        config.latency_test_count, config.latency_test_size
    ));
    summary.push_str(&format!(
        "  Website probes: {} targets, {}s timeout, {} concurrent",
        config.websites.len(),
        config.probe_timeout.as_secs(),
        config.max_concurrent_probes
    ));
    summary
}

#[cfg(test)]
mod comprehensive_tests;
