use std::future::Future;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::aggregator::{Aggregator, Outcome};
use crate::config::Config;
use crate::errors::ErrorCategory;
use crate::executor::execute_request;
use crate::payload::Task;
use crate::report::Report;

/// Configuration for the bounded worker pool.
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    pub total_requests: usize,
    /// Maximum number of tasks in flight at any instant, at least 1
    pub concurrency: usize,
    /// Emit a progress line every this many completions; 0 disables it
    pub progress_interval: u64,
}

impl From<&Config> for WorkerPoolConfig {
    fn from(config: &Config) -> Self {
        Self {
            total_requests: config.total_requests,
            concurrency: config.concurrency,
            progress_interval: config.progress_interval,
        }
    }
}

/// Facts about a finished run that the aggregate itself does not hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Wall-clock time from the first dispatch until the pool drained
    pub duration: Duration,
    /// Highest number of tasks observed executing at the same time
    pub peak_in_flight: usize,
}

#[derive(Debug, Default)]
struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    fn enter(self: &Arc<Self>) -> InFlightGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlightGuard(self.clone())
    }
}

struct InFlightGuard(Arc<InFlight>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs `total_requests` tasks through `execute`, never more than
/// `concurrency` at once, and returns once every task has been recorded.
///
/// Each task holds a semaphore permit from admission until its outcome is in
/// `aggregator`; the next task is admitted as soon as any permit frees. A task
/// that panics is recorded as a failed outcome so the aggregate always ends up
/// with exactly `total_requests` entries.
pub async fn run_load_test<F, Fut>(
    config: &WorkerPoolConfig,
    aggregator: Arc<Aggregator>,
    execute: F,
) -> RunSummary
where
    F: Fn(Task) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    let start_time = Instant::now();
    let permits = config.concurrency.clamp(1, Semaphore::MAX_PERMITS);
    let semaphore = Arc::new(Semaphore::new(permits));
    let in_flight = Arc::new(InFlight::default());
    let execute = Arc::new(execute);
    let progress = Progress {
        interval: config.progress_interval,
        total: config.total_requests,
        start_time,
    };
    let mut tasks = JoinSet::new();

    debug!(
        total_requests = config.total_requests,
        concurrency = config.concurrency,
        permits,
        "Dispatching tasks"
    );

    for id in 0..config.total_requests {
        // The semaphore is owned here and never closed.
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                error!(error = %e, "Worker pool semaphore closed");
                break;
            }
        };

        let task = Task::new(id);
        let execute = execute.clone();
        let task_aggregator = aggregator.clone();
        let in_flight = in_flight.clone();

        tasks.spawn(async move {
            let _permit = permit;
            let outcome = {
                let _guard = in_flight.enter();
                execute(task).await
            };
            let completed = task_aggregator.record(outcome);
            progress.on_completed(completed);
        });

        reap_finished(&mut tasks, &aggregator, progress);
    }

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            record_join_error(&e, &aggregator, progress);
        }
    }

    let summary = RunSummary {
        duration: start_time.elapsed(),
        peak_in_flight: in_flight.peak.load(Ordering::SeqCst),
    };

    info!(
        completed = aggregator.completed(),
        duration_secs = summary.duration.as_secs_f64(),
        peak_in_flight = summary.peak_in_flight,
        "All tasks completed"
    );

    summary
}

/// Joins every task that has already finished, without waiting.
///
/// Returns how many were joined.
fn reap_finished(tasks: &mut JoinSet<()>, aggregator: &Aggregator, progress: Progress) -> usize {
    let mut joined = 0;
    while let Some(result) = tasks.try_join_next() {
        joined += 1;
        if let Err(e) = result {
            record_join_error(&e, aggregator, progress);
        }
    }
    joined
}

/// Records a task that never produced an outcome as a failure.
///
/// Recording cannot panic, so a failed join means `execute` did. Returns
/// whether the recorded completion triggered a progress line.
fn record_join_error(error: &JoinError, aggregator: &Aggregator, progress: Progress) -> bool {
    error!(error = %error, "Worker task failed");
    let completed = aggregator.record(Outcome::failure(
        0.0,
        ErrorCategory::OtherError,
        None,
        format!("worker task failed: {}", error),
    ));
    progress.on_completed(completed)
}

#[derive(Debug, Clone, Copy)]
struct Progress {
    /// 0 disables progress lines
    interval: u64,
    total: usize,
    start_time: Instant,
}

impl Progress {
    /// Emits a progress line when `completed` is a multiple of the interval.
    fn on_completed(&self, completed: u64) -> bool {
        if self.interval == 0 || completed % self.interval != 0 {
            return false;
        }

        let secs = self.start_time.elapsed().as_secs_f64();
        let rate = if secs > 0.0 {
            completed as f64 / secs
        } else {
            0.0
        };

        debug!(completed, total = self.total, elapsed_secs = secs, rate, "Progress");

        // Progress is advisory; a closed stdout must not take the worker down.
        let _ = writeln!(
            std::io::stdout(),
            "  Progress: {}/{} ({:.0} req/s, {:.1}s elapsed)",
            completed,
            self.total,
            rate,
            secs
        );
        true
    }
}

/// Runs a full POST load test against `config.target_url` and builds its report.
pub async fn run_post_load_test(config: &Config, client: reqwest::Client) -> Report {
    let aggregator = Arc::new(Aggregator::with_capacity(config.total_requests));
    let url: Arc<str> = Arc::from(config.target_url.as_str());

    let summary = run_load_test(
        &WorkerPoolConfig::from(config),
        aggregator.clone(),
        move |task| {
            let client = client.clone();
            let url = url.clone();
            async move { execute_request(&client, &url, &task).await }
        },
    )
    .await;

    let state = match Arc::try_unwrap(aggregator) {
        Ok(aggregator) => aggregator.into_state(),
        Err(shared) => shared.snapshot(),
    };

    let report = Report::new(&state, &summary);
    if let Some(stats) = &report.latency {
        debug!(latency = %stats.format(), "Latency summary");
    }
    report
}
