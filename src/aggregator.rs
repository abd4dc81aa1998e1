//! Thread-safe accumulation of request outcomes.
//!
//! Every worker funnels its [`Outcome`] through [`Aggregator::record`], which
//! applies all of an outcome's updates under a single lock. A separate atomic
//! counter tracks completions so progress can be read without contending for
//! that lock.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::errors::ErrorCategory;

/// Result of one completed request.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub latency_ms: f64,
    pub success: bool,
    /// `Status <code>: <body prefix>` or the transport error text
    pub detail: Option<String>,
    pub category: Option<ErrorCategory>,
    pub status_code: Option<u16>,
}

impl Outcome {
    pub fn success(latency_ms: f64, status_code: u16) -> Self {
        Self {
            latency_ms,
            success: true,
            detail: None,
            category: None,
            status_code: Some(status_code),
        }
    }

    pub fn failure(
        latency_ms: f64,
        category: ErrorCategory,
        status_code: Option<u16>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            latency_ms,
            success: false,
            detail: Some(detail.into()),
            category: Some(category),
            status_code,
        }
    }
}

/// Everything recorded so far. Only ever mutated through [`Aggregator`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateState {
    /// Latencies in completion order
    pub latencies: Vec<f64>,
    pub success_count: u64,
    pub error_count: u64,
    pub errors: Vec<String>,
    pub errors_by_category: BTreeMap<ErrorCategory, u64>,
    pub status_codes: BTreeMap<u16, u64>,
}

impl AggregateState {
    pub fn total(&self) -> u64 {
        self.success_count + self.error_count
    }

    fn apply(&mut self, outcome: Outcome) {
        self.latencies.push(outcome.latency_ms);
        if outcome.success {
            self.success_count += 1;
        } else {
            self.error_count += 1;
            if let Some(detail) = outcome.detail {
                self.errors.push(detail);
            }
            if let Some(category) = outcome.category {
                *self.errors_by_category.entry(category).or_insert(0) += 1;
            }
        }
        if let Some(code) = outcome.status_code {
            *self.status_codes.entry(code).or_insert(0) += 1;
        }
    }
}

/// Upper bound on latency slots reserved up front; the buffer grows past it.
pub const MAX_PREALLOCATED_SAMPLES: usize = 1 << 20;

/// Shared accumulation point for all workers of a run.
#[derive(Debug, Default)]
pub struct Aggregator {
    state: Mutex<AggregateState>,
    completed: AtomicU64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-sizes the latency buffer for an expected number of outcomes,
    /// capped at [`MAX_PREALLOCATED_SAMPLES`].
    pub fn with_capacity(expected: usize) -> Self {
        let state = AggregateState {
            latencies: Vec::with_capacity(expected.min(MAX_PREALLOCATED_SAMPLES)),
            ..AggregateState::default()
        };
        Self {
            state: Mutex::new(state),
            completed: AtomicU64::new(0),
        }
    }

    /// Records one outcome and returns its 1-indexed completion number.
    pub fn record(&self, outcome: Outcome) -> u64 {
        self.lock().apply(outcome);
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Number of outcomes recorded so far. Advisory while workers are running.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> AggregateState {
        self.lock().clone()
    }

    /// Consumes the aggregator once every worker has finished.
    pub fn into_state(self) -> AggregateState {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> MutexGuard<'_, AggregateState> {
        // `apply` never panics midway, so a poisoned state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_record_success_and_failure() {
        let aggregator = Aggregator::new();

        assert_eq!(aggregator.record(Outcome::success(5.0, 201)), 1);
        assert_eq!(
            aggregator.record(Outcome::failure(
                7.5,
                ErrorCategory::ServerError,
                Some(500),
                "Status 500: boom"
            )),
            2
        );

        let state = aggregator.into_state();
        assert_eq!(state.latencies, vec![5.0, 7.5]);
        assert_eq!(state.success_count, 1);
        assert_eq!(state.error_count, 1);
        assert_eq!(state.errors, vec!["Status 500: boom".to_string()]);
        assert_eq!(state.errors_by_category[&ErrorCategory::ServerError], 1);
        assert_eq!(state.status_codes[&201], 1);
        assert_eq!(state.status_codes[&500], 1);
    }

    #[test]
    fn test_transport_failure_has_no_status_code() {
        let aggregator = Aggregator::new();
        aggregator.record(Outcome::failure(
            3.0,
            ErrorCategory::NetworkError,
            None,
            "connection refused",
        ));

        let state = aggregator.snapshot();
        assert!(state.status_codes.is_empty());
        assert_eq!(state.errors_by_category[&ErrorCategory::NetworkError], 1);
    }

    #[test]
    fn test_huge_expected_count_does_not_overallocate() {
        let aggregator = Aggregator::with_capacity(usize::MAX);
        assert_eq!(aggregator.record(Outcome::success(1.0, 201)), 1);

        let state = aggregator.into_state();
        assert_eq!(state.latencies, vec![1.0]);
        assert!(state.latencies.capacity() <= MAX_PREALLOCATED_SAMPLES);
    }

    #[test]
    fn test_concurrent_records_are_not_lost() {
        let aggregator = Arc::new(Aggregator::with_capacity(8 * 500));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let aggregator = aggregator.clone();
                std::thread::spawn(move || {
                    for i in 0..500 {
                        if (t + i) % 4 == 0 {
                            aggregator.record(Outcome::failure(
                                i as f64,
                                ErrorCategory::TimeoutError,
                                None,
                                "timed out",
                            ));
                        } else {
                            aggregator.record(Outcome::success(i as f64, 200));
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(aggregator.completed(), 4000);
        let state = Arc::try_unwrap(aggregator).unwrap().into_state();
        assert_eq!(state.total(), 4000);
        assert_eq!(state.latencies.len(), 4000);
        assert_eq!(state.errors.len() as u64, state.error_count);
        assert_eq!(state.error_count, 1000);
    }
}
