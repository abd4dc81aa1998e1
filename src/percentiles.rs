//! Descriptive statistics over collected latency samples.
//!
//! Percentiles use the nearest-rank estimator over the sorted samples: the
//! value at index `floor(len * q)`, clamped to the last element. No
//! interpolation between ranks.

/// Latency statistics for one run, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub count: usize,
    pub min: f64,
    pub median: f64,
    pub mean: f64,
    pub p95: f64,
    pub p99: f64,
    pub max: f64,
}

impl LatencyStats {
    /// Computes statistics over `samples`.
    ///
    /// Returns `None` when there are no samples. The input is not modified.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        Some(Self::from_sorted(&sorted))
    }

    fn from_sorted(sorted: &[f64]) -> Self {
        let count = sorted.len();
        let sum: f64 = sorted.iter().sum();

        Self {
            count,
            min: sorted[0],
            median: median(sorted),
            mean: sum / count as f64,
            p95: nearest_rank(sorted, 0.95),
            p99: nearest_rank(sorted, 0.99),
            max: sorted[count - 1],
        }
    }

    /// Format statistics as a human-readable string.
    pub fn format(&self) -> String {
        format!(
            "count={}, min={:.2}ms, median={:.2}ms, mean={:.2}ms, p95={:.2}ms, p99={:.2}ms, max={:.2}ms",
            self.count, self.min, self.median, self.mean, self.p95, self.p99, self.max,
        )
    }
}

/// Median of an ascending, non-empty slice.
fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Nearest-rank percentile of an ascending, non-empty slice.
pub fn nearest_rank(sorted: &[f64], quantile: f64) -> f64 {
    let index = (sorted.len() as f64 * quantile).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_samples() {
        assert!(LatencyStats::from_samples(&[]).is_none());
    }

    #[test]
    fn test_single_sample_clamps_percentiles() {
        let stats = LatencyStats::from_samples(&[42.0]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.min, 42.0);
        assert_eq!(stats.median, 42.0);
        assert_eq!(stats.mean, 42.0);
        assert_eq!(stats.p95, 42.0);
        assert_eq!(stats.p99, 42.0);
        assert_eq!(stats.max, 42.0);
    }

    #[test]
    fn test_even_length_median_averages_middle() {
        let stats = LatencyStats::from_samples(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.mean, 2.5);
    }

    #[test]
    fn test_odd_length_median() {
        let stats = LatencyStats::from_samples(&[9.0, 1.0, 5.0]).unwrap();
        assert_eq!(stats.median, 5.0);
    }

    #[test]
    fn test_nearest_rank_indices() {
        // 1..=100: floor(100 * 0.95) = 95 -> value 96, floor(100 * 0.99) = 99 -> value 100
        let samples: Vec<f64> = (1..=100).map(f64::from).collect();
        let stats = LatencyStats::from_samples(&samples).unwrap();
        assert_eq!(stats.p95, 96.0);
        assert_eq!(stats.p99, 100.0);

        // floor(20 * 0.99) = 19 is the last index
        let samples: Vec<f64> = (1..=20).map(f64::from).collect();
        let stats = LatencyStats::from_samples(&samples).unwrap();
        assert_eq!(stats.p95, 20.0);
        assert_eq!(stats.p99, 20.0);

        // floor(10 * 0.95) = 9, floor(10 * 0.99) = 9
        let samples: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(nearest_rank(&samples, 0.95), 10.0);
        assert_eq!(nearest_rank(&samples, 0.5), 6.0);
    }

    #[test]
    fn test_long_tail_visible_in_high_percentiles() {
        let mut samples = vec![10.0; 80];
        samples.extend(std::iter::repeat(10_000.0).take(20));
        let stats = LatencyStats::from_samples(&samples).unwrap();

        assert_eq!(stats.median, 10.0);
        assert_eq!(stats.p95, 10_000.0);
        assert_eq!(stats.p99, 10_000.0);
        assert_eq!(stats.mean, (80.0 * 10.0 + 20.0 * 10_000.0) / 100.0);
    }

    #[test]
    fn test_input_not_reordered_and_idempotent() {
        let samples = vec![3.0, 1.0, 2.0];
        let first = LatencyStats::from_samples(&samples).unwrap();
        let second = LatencyStats::from_samples(&samples).unwrap();
        assert_eq!(first, second);
        assert_eq!(samples, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_format() {
        let stats = LatencyStats::from_samples(&[1.0, 2.0]).unwrap();
        let formatted = stats.format();
        assert!(formatted.contains("count=2"));
        assert!(formatted.contains("median=1.50ms"));
    }
}
