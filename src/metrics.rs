use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use tracing::warn;

const METRIC_NAMESPACE: &str = "write_loadtest";

lazy_static::lazy_static! {
    /// Registry holding every metric this crate exposes.
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref REQUEST_TOTAL: IntCounter =
        IntCounter::with_opts(
            Opts::new("requests_total", "Total number of HTTP requests made")
                .namespace(METRIC_NAMESPACE)
        ).unwrap();

    pub static ref REQUEST_STATUS_CODES: IntCounterVec =
        IntCounterVec::new(
            Opts::new("requests_status_codes_total", "Number of HTTP requests by status code")
                .namespace(METRIC_NAMESPACE),
            &["status_code"]
        ).unwrap();

    pub static ref REQUEST_ERRORS_BY_CATEGORY: IntCounterVec =
        IntCounterVec::new(
            Opts::new("requests_errors_total", "Number of failed HTTP requests by category")
                .namespace(METRIC_NAMESPACE),
            &["category"]
        ).unwrap();

    pub static ref CONCURRENT_REQUESTS: Gauge =
        Gauge::with_opts(
            Opts::new("concurrent_requests", "Number of HTTP requests currently in flight")
                .namespace(METRIC_NAMESPACE)
        ).unwrap();

    pub static ref REQUEST_DURATION_SECONDS: Histogram =
        Histogram::with_opts(
            HistogramOpts::new(
                "request_duration_seconds",
                "HTTP request latencies in seconds."
            ).namespace(METRIC_NAMESPACE)
        ).unwrap();
}

/// Registers all metrics with [`REGISTRY`].
///
/// Calling this more than once returns an `AlreadyReg` error.
pub fn register_metrics() -> Result<(), prometheus::Error> {
    REGISTRY.register(Box::new(REQUEST_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEST_STATUS_CODES.clone()))?;
    REGISTRY.register(Box::new(REQUEST_ERRORS_BY_CATEGORY.clone()))?;
    REGISTRY.register(Box::new(CONCURRENT_REQUESTS.clone()))?;
    REGISTRY.register(Box::new(REQUEST_DURATION_SECONDS.clone()))?;
    Ok(())
}

/// Gathers and encodes metrics in the Prometheus text format.
pub fn gather_metrics_string() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8(buffer).unwrap_or_else(|e| {
        warn!(error = %e, "Metrics output was not valid UTF-8");
        String::from("# ERROR ENCODING METRICS TO UTF-8")
    })
}

/// Returns a static string label for common HTTP status codes.
///
/// Uncommon codes fall back to "other" rather than allocating a unique string.
pub fn status_code_label(code: u16) -> &'static str {
    match code {
        200 => "200",
        201 => "201",
        204 => "204",
        301 => "301",
        302 => "302",
        400 => "400",
        401 => "401",
        403 => "403",
        404 => "404",
        405 => "405",
        409 => "409",
        413 => "413",
        415 => "415",
        422 => "422",
        429 => "429",
        500 => "500",
        502 => "502",
        503 => "503",
        504 => "504",
        _ => "other",
    }
}
