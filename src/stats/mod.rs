//! Latency statistics calculation

use crate::models::metrics::LatencyStatistics;

/// Round to 2 decimal places, the precision used throughout the API
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute min/max/avg/median/jitter over latency samples in milliseconds.
///
/// Takes ownership of the samples since they are sorted in place. An empty
/// input yields all-zero statistics. Jitter is the population standard
/// deviation (divided by `n`, not `n - 1`). Every field is rounded to 2
/// decimals.
pub fn calculate_latency_stats(mut latencies: Vec<f64>) -> LatencyStatistics {
    if latencies.is_empty() {
        return LatencyStatistics::empty();
    }

    latencies.sort_by(|a, b| a.total_cmp(b));

    let count = latencies.len();
    let min = latencies[0];
    let max = latencies[count - 1];
    let avg = latencies.iter().sum::<f64>() / count as f64;
    let median = median_of_sorted(&latencies);

    let variance = latencies
        .iter()
        .map(|&x| (x - avg).powi(2))
        .sum::<f64>()
        / count as f64;
    let jitter = variance.sqrt();

    LatencyStatistics {
        min: round2(min),
        max: round2(max),
        avg: round2(avg),
        median: round2(median),
        jitter: round2(jitter),
    }
}

/// Median of an ascending, non-empty slice
fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let stats = calculate_latency_stats(Vec::new());
        assert_eq!(stats, LatencyStatistics { min: 0.0, max: 0.0, avg: 0.0, median: 0.0, jitter: 0.0 });
    }

    #[test]
    fn test_odd_count_median() {
        let stats = calculate_latency_stats(vec![30.0, 10.0, 20.0]);
        assert_eq!(stats.median, 20.0);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 30.0);
        assert_eq!(stats.avg, 20.0);
    }

    #[test]
    fn test_even_count_median() {
        let stats = calculate_latency_stats(vec![40.0, 10.0, 30.0, 20.0]);
        assert_eq!(stats.median, 25.0);
        assert_eq!(stats.avg, 25.0);
    }

    #[test]
    fn test_population_jitter() {
        // deviations from mean 5: -3,-1,-1,-1,0,0,2,4 -> variance 32/8 = 4
        let stats = calculate_latency_stats(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.jitter, 2.0);
    }

    #[test]
    fn test_single_sample() {
        let stats = calculate_latency_stats(vec![0.123456]);
        assert_eq!(stats.min, 0.12);
        assert_eq!(stats.max, 0.12);
        assert_eq!(stats.median, 0.12);
        assert_eq!(stats.jitter, 0.0);
    }

    #[test]
    fn test_rounding() {
        let stats = calculate_latency_stats(vec![1.005, 2.0]);
        assert_eq!(stats.max, 2.0);
        assert_eq!(round2(1.2345), 1.23);
        assert_eq!(round2(0.0), 0.0);
    }
}
