//! Latency statistics and connectivity result data models

use crate::{error::AppError, stats::round2};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Aggregate over a set of latency samples, all values in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatencyStatistics {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub median: f64,
    /// Population standard deviation
    pub jitter: f64,
}

impl LatencyStatistics {
    /// Statistics over an empty sample set
    pub fn empty() -> Self {
        Self::default()
    }
}

/// One entry of the latency test breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencySampleDetail {
    /// 1-based sample index
    pub test: u32,
    /// Sample latency rounded to 2 decimals (milliseconds)
    pub latency: f64,
    pub timestamp: String,
}

impl LatencySampleDetail {
    pub fn new(test: u32, latency_ms: f64) -> Self {
        Self {
            test,
            latency: round2(latency_ms),
            timestamp: super::iso_timestamp(),
        }
    }
}

/// Outcome of probing a single website
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityResult {
    /// URL that was probed
    pub url: String,

    /// Whether any HTTP response was received
    pub accessible: bool,

    /// Elapsed time until response headers arrived (or the failure surfaced)
    pub response_time_ms: f64,

    /// HTTP status code of the final response, if any
    pub status_code: Option<u16>,

    /// Failure label: "timeout", "connection failed", or the transport error text
    pub error: Option<String>,

    /// When the probe completed
    pub timestamp: String,
}

impl ConnectivityResult {
    /// Create a result for a probe that received a response
    pub fn success(url: impl Into<String>, elapsed: Duration, status_code: u16) -> Self {
        Self {
            url: url.into(),
            accessible: true,
            response_time_ms: duration_ms(elapsed),
            status_code: Some(status_code),
            error: None,
            timestamp: super::iso_timestamp(),
        }
    }

    /// Create a result for a probe that failed before any response arrived
    pub fn failed(url: impl Into<String>, elapsed: Duration, error: &AppError) -> Self {
        Self {
            url: url.into(),
            accessible: false,
            response_time_ms: duration_ms(elapsed),
            status_code: None,
            error: Some(error.probe_label()),
            timestamp: super::iso_timestamp(),
        }
    }
}

/// Aggregate over all results of one probe run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectivitySummary {
    pub total: usize,
    pub accessible_count: usize,
    pub failed_count: usize,
    /// Mean response time over accessible targets only; 0 when none are accessible
    pub average_response_time_ms: f64,
}

impl ConnectivitySummary {
    /// Summarise a run; result ordering does not affect the outcome
    pub fn from_results<'a, I>(results: I) -> Self
    where
        I: IntoIterator<Item = &'a ConnectivityResult>,
    {
        let mut total = 0;
        let mut accessible_count = 0;
        let mut accessible_time_sum = 0.0;

        for result in results {
            total += 1;
            if result.accessible {
                accessible_count += 1;
                accessible_time_sum += result.response_time_ms;
            }
        }

        let average_response_time_ms = if accessible_count > 0 {
            round2(accessible_time_sum / accessible_count as f64)
        } else {
            0.0
        };

        Self {
            total,
            accessible_count,
            failed_count: total - accessible_count,
            average_response_time_ms,
        }
    }
}

fn duration_ms(duration: Duration) -> f64 {
    round2(duration.as_secs_f64() * 1000.0)
}
