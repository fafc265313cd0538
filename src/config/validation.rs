//! Configuration validation utilities and rules

use crate::{
    error::{AppError, Result},
    models::config::{ServerConfig, SizeProfile, WebsiteTarget},
};
use std::collections::HashSet;
use std::time::Duration;

/// Configuration validator run once before the listener starts
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration; errors are fatal, warnings are informational
    pub fn validate(config: &ServerConfig) -> Result<Vec<ValidationWarning>> {
        let mut warnings = Vec::new();

        warnings.extend(Self::validate_file_sizes(&config.file_sizes, &config.default_size_key)?);
        warnings.extend(Self::validate_streaming(config)?);
        warnings.extend(Self::validate_websites(&config.websites)?);
        warnings.extend(Self::validate_probe_settings(config)?);

        Ok(warnings)
    }

    /// Validate the download size table and its default key
    fn validate_file_sizes(sizes: &[SizeProfile], default_key: &str) -> Result<Vec<ValidationWarning>> {
        let mut warnings = Vec::new();

        if sizes.is_empty() {
            return Err(AppError::config("File size table cannot be empty"));
        }

        let mut seen = HashSet::new();
        for profile in sizes {
            if profile.key.trim().is_empty() {
                return Err(AppError::config("File size key cannot be empty"));
            }
            if !seen.insert(profile.key.as_str()) {
                return Err(AppError::config(format!("Duplicate file size key '{}'", profile.key)));
            }
            if profile.size_bytes == 0 {
                return Err(AppError::config(format!(
                    "File size '{}' must be a positive byte count",
                    profile.key
                )));
            }
            // key is embedded in the Content-Disposition header
            if !profile.key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                return Err(AppError::config(format!(
                    "File size key '{}' may only contain ASCII letters, digits, '-' and '_'",
                    profile.key
                )));
            }
            if profile.size_bytes > 1024 * crate::defaults::MEBIBYTE {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("File size '{}' exceeds 1 GiB; downloads will take a long time", profile.key),
                ));
            }
        }

        if !seen.contains(default_key) {
            return Err(AppError::config(format!(
                "Default size '{}' is not in the file size table",
                default_key
            )));
        }

        Ok(warnings)
    }

    /// Validate chunking and latency sampling parameters
    fn validate_streaming(config: &ServerConfig) -> Result<Vec<ValidationWarning>> {
        let mut warnings = Vec::new();

        if config.chunk_size == 0 {
            return Err(AppError::config("Chunk size must be greater than zero"));
        }
        if config.latency_test_count == 0 {
            return Err(AppError::config("Latency test count must be greater than zero"));
        }
        if config.latency_test_size == 0 {
            return Err(AppError::config("Latency test size must be greater than zero"));
        }

        if config.chunk_size > 1024 * 1024 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!("Chunk size of {} bytes will raise per-download memory use", config.chunk_size),
            ));
        }

        Ok(warnings)
    }

    /// Validate website probe targets
    fn validate_websites(websites: &[WebsiteTarget]) -> Result<Vec<ValidationWarning>> {
        let mut warnings = Vec::new();

        if websites.is_empty() {
            return Err(AppError::config("Website list cannot be empty"));
        }

        let mut seen = HashSet::new();
        for site in websites {
            if site.key.trim().is_empty() {
                return Err(AppError::config("Website key cannot be empty"));
            }
            if !seen.insert(site.key.as_str()) {
                return Err(AppError::config(format!("Duplicate website key '{}'", site.key)));
            }

            let parsed = url::Url::parse(&site.url)
                .map_err(|e| AppError::config(format!("Invalid URL '{}' for website '{}': {}", site.url, site.key, e)))?;

            match parsed.scheme() {
                "https" => {}
                "http" => {
                    warnings.push(ValidationWarning::new(
                        ValidationLevel::Warning,
                        format!("Website '{}' uses HTTP instead of HTTPS", site.key),
                    ));
                }
                other => {
                    return Err(AppError::config(format!(
                        "Website '{}' uses unsupported scheme '{}'",
                        site.key, other
                    )));
                }
            }

            if parsed.host_str().is_none() {
                return Err(AppError::config(format!("Website '{}' URL has no host", site.key)));
            }
        }

        Ok(warnings)
    }

    /// Validate probe timeout and concurrency
    fn validate_probe_settings(config: &ServerConfig) -> Result<Vec<ValidationWarning>> {
        let mut warnings = Vec::new();

        if config.probe_timeout == Duration::ZERO {
            return Err(AppError::config("Probe timeout must be greater than zero"));
        }
        if config.max_concurrent_probes == 0 {
            return Err(AppError::config("Probe concurrency must be at least 1"));
        }

        if config.probe_timeout < Duration::from_secs(3) {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Probe timeout of {:.1}s may report slow sites as unreachable",
                    config.probe_timeout.as_secs_f64()
                ),
            ));
        } else if config.probe_timeout > Duration::from_secs(60) {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "Long probe timeout of {}s will slow down the website test",
                    config.probe_timeout.as_secs()
                ),
            ));
        }

        if config.max_concurrent_probes > config.websites.len() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!(
                    "Probe concurrency {} exceeds the {} configured websites",
                    config.max_concurrent_probes,
                    config.websites.len()
                ),
            ));
        }

        Ok(warnings)
    }
}

/// Validation warning levels
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
}

impl ValidationLevel {
    /// Get display string for level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    /// Create a new validation warning
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        if use_color {
            use colored::Colorize;
            let level = match self.level {
                ValidationLevel::Info => self.level.as_str().blue(),
                ValidationLevel::Warning => self.level.as_str().yellow(),
            };
            format!("[{}] {}", level, self.message)
        } else {
            format!("[{}] {}", self.level.as_str(), self.message)
        }
    }
}

/// Convenience function for configuration validation
pub fn validate_config(config: &ServerConfig) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate(config)
}
