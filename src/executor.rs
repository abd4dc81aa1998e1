use tokio::time::Instant;
use tracing::debug;

use crate::aggregator::Outcome;
use crate::errors::{error_chain, ErrorCategory};
use crate::metrics::{
    status_code_label, CONCURRENT_REQUESTS, REQUEST_DURATION_SECONDS, REQUEST_ERRORS_BY_CATEGORY,
    REQUEST_STATUS_CODES, REQUEST_TOTAL,
};
use crate::payload::Task;

/// Number of response body characters kept in a failure detail.
pub const BODY_SNIPPET_CHARS: usize = 100;

/// Sends one task's POST and converts whatever happens into an [`Outcome`].
///
/// Never fails: transport errors and unexpected status codes become failed
/// outcomes. Latency covers sending the request and reading the full response
/// body, or the time until the error surfaced. The request timeout is the one
/// configured on `client`.
pub async fn execute_request(client: &reqwest::Client, url: &str, task: &Task) -> Outcome {
    CONCURRENT_REQUESTS.inc();
    REQUEST_TOTAL.inc();

    let start = Instant::now();
    let result = send(client, url, task).await;
    let elapsed = start.elapsed();
    let latency_ms = elapsed.as_secs_f64() * 1000.0;

    REQUEST_DURATION_SECONDS.observe(elapsed.as_secs_f64());
    CONCURRENT_REQUESTS.dec();

    let outcome = match result {
        Ok((status, body)) => {
            REQUEST_STATUS_CODES
                .with_label_values(&[status_code_label(status)])
                .inc();
            classify_response(latency_ms, status, &body)
        }
        Err(e) => {
            REQUEST_STATUS_CODES.with_label_values(&["error"]).inc();
            let category = ErrorCategory::from_reqwest_error(&e);
            Outcome::failure(latency_ms, category, None, error_chain(&e))
        }
    };

    if let Some(category) = outcome.category {
        REQUEST_ERRORS_BY_CATEGORY
            .with_label_values(&[category.label()])
            .inc();
        debug!(
            task_id = task.id,
            latency_ms = latency_ms,
            error_category = category.label(),
            detail = outcome.detail.as_deref().unwrap_or_default(),
            "Request failed"
        );
    }

    outcome
}

async fn send(
    client: &reqwest::Client,
    url: &str,
    task: &Task,
) -> Result<(u16, String), reqwest::Error> {
    let response = client
        .post(url)
        .header("Content-Type", "application/json")
        .json(&task.payload)
        .send()
        .await?;

    let status = response.status().as_u16();
    let body = response.text().await?;
    Ok((status, body))
}

/// Maps a received response onto an outcome: only 200 and 201 count as success.
pub fn classify_response(latency_ms: f64, status: u16, body: &str) -> Outcome {
    match ErrorCategory::from_status_code(status) {
        None => Outcome::success(latency_ms, status),
        Some(category) => {
            let snippet: String = body.chars().take(BODY_SNIPPET_CHARS).collect();
            Outcome::failure(
                latency_ms,
                category,
                Some(status),
                format!("Status {}: {}", status, snippet),
            )
        }
    }
}
