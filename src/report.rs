//! Final benchmark report.
//!
//! Built once from the drained [`AggregateState`] and rendered as the block of
//! text printed at the end of a run.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::aggregator::AggregateState;
use crate::errors::ErrorCategory;
use crate::percentiles::LatencyStats;
use crate::worker::RunSummary;

/// Sample errors are listed only when there are at most this many.
pub const MAX_LISTED_ERRORS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub total_requests: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub duration: Duration,
    pub requests_per_sec: f64,
    pub peak_in_flight: usize,
    /// `None` when no latency was recorded
    pub latency: Option<LatencyStats>,
    pub errors: Vec<String>,
    pub errors_by_category: BTreeMap<ErrorCategory, u64>,
    pub status_codes: BTreeMap<u16, u64>,
}

impl Report {
    pub fn new(state: &AggregateState, summary: &RunSummary) -> Self {
        let total_requests = state.total();
        Self {
            total_requests,
            success_count: state.success_count,
            error_count: state.error_count,
            duration: summary.duration,
            requests_per_sec: throughput(total_requests, summary.duration),
            peak_in_flight: summary.peak_in_flight,
            latency: LatencyStats::from_samples(&state.latencies),
            errors: state.errors.clone(),
            errors_by_category: state.errors_by_category.clone(),
            status_codes: state.status_codes.clone(),
        }
    }

    pub fn success_rate(&self) -> f64 {
        percent(self.success_count, self.total_requests)
    }

    pub fn error_rate(&self) -> f64 {
        percent(self.error_count, self.total_requests)
    }

    /// Whether the sample error list is short enough to print.
    pub fn lists_errors(&self) -> bool {
        !self.errors.is_empty() && self.errors.len() <= MAX_LISTED_ERRORS
    }

    pub fn format(&self) -> String {
        let rule = "=".repeat(60);
        let mut output = String::new();

        output.push_str(&format!("\n{}\n", rule));
        output.push_str("BENCHMARK RESULTS\n");
        output.push_str(&format!("{}\n\n", rule));

        output.push_str(&format!("Total Requests:     {}\n", self.total_requests));
        output.push_str(&format!(
            "Successful:         {} ({:.1}%)\n",
            self.success_count,
            self.success_rate()
        ));
        output.push_str(&format!(
            "Failed:             {} ({:.1}%)\n",
            self.error_count,
            self.error_rate()
        ));
        output.push_str(&format!(
            "Duration:           {:.2}s\n",
            self.duration.as_secs_f64()
        ));
        output.push_str(&format!("Requests/sec:       {:.2}\n", self.requests_per_sec));
        output.push_str(&format!("Peak In-Flight:     {}\n", self.peak_in_flight));

        if let Some(stats) = &self.latency {
            output.push_str("\nLatency Statistics (ms):\n");
            output.push_str(&format!("  Min:     {:.2}\n", stats.min));
            output.push_str(&format!("  Median:  {:.2}\n", stats.median));
            output.push_str(&format!("  Mean:    {:.2}\n", stats.mean));
            output.push_str(&format!("  P95:     {:.2}\n", stats.p95));
            output.push_str(&format!("  P99:     {:.2}\n", stats.p99));
            output.push_str(&format!("  Max:     {:.2}\n", stats.max));
        }

        if !self.errors_by_category.is_empty() {
            output.push_str("\nErrors by Category:\n");
            for category in ErrorCategory::all() {
                if let Some(count) = self.errors_by_category.get(&category) {
                    output.push_str(&format!(
                        "  {:<28} {:>8} ({:.1}%)\n",
                        category,
                        count,
                        percent(*count, self.total_requests)
                    ));
                }
            }
        }

        if self.error_count > 0 && !self.status_codes.is_empty() {
            output.push_str("\nStatus Codes:\n");
            for (code, count) in &self.status_codes {
                output.push_str(&format!("  {:<6} {:>8}\n", code, count));
            }
        }

        if self.lists_errors() {
            output.push_str("\nSample Errors:\n");
            for err in self.errors.iter().take(MAX_LISTED_ERRORS) {
                output.push_str(&format!("  - {}\n", err));
            }
        }

        output
    }
}

/// Requests per second over the whole run; 0 for a zero-length run.
pub fn throughput(total_requests: u64, duration: Duration) -> f64 {
    let secs = duration.as_secs_f64();
    if secs > 0.0 {
        total_requests as f64 / secs
    } else {
        0.0
    }
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
