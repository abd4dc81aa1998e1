use tokio::time::Duration;

use crate::client::ClientConfig;
use crate::errors::ConfigError;

pub const DEFAULT_TOTAL_REQUESTS: usize = 10_000;
pub const DEFAULT_CONCURRENCY: usize = 100;
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Main configuration for a load test run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub target_url: String,
    pub total_requests: usize,
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub progress_interval: u64,
}

impl Config {
    /// Builds a configuration with the default timeout and progress interval.
    pub fn new(target_url: impl Into<String>, total_requests: usize, concurrency: usize) -> Self {
        Self {
            target_url: target_url.into(),
            total_requests,
            concurrency,
            request_timeout: REQUEST_TIMEOUT,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Parses positional arguments: `<url> [total_requests] [concurrency]`.
    ///
    /// `args` excludes the program name.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, ConfigError> {
        let target_url = match args.first() {
            Some(url) if !url.as_ref().trim().is_empty() => url.as_ref().trim().to_string(),
            _ => return Err(ConfigError::MissingUrl),
        };

        let total_requests =
            parse_count(args.get(1), "total_requests")?.unwrap_or(DEFAULT_TOTAL_REQUESTS);
        let concurrency = parse_count(args.get(2), "concurrency")?.unwrap_or(DEFAULT_CONCURRENCY);

        if concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }

        Ok(Self::new(target_url, total_requests, concurrency))
    }

    /// Creates a ClientConfig from this Config.
    pub fn to_client_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: self.request_timeout,
            max_idle_per_host: self.concurrency,
            ..ClientConfig::default()
        }
    }

    /// Prints the startup banner.
    pub fn print_summary(&self) {
        println!(
            "Starting load test: {} requests with {} concurrent connections",
            self.total_requests, self.concurrency
        );
        println!("  Target: POST {}", self.target_url);
        println!("  Request timeout: {:?}", self.request_timeout);
        println!();
    }
}

fn parse_count<S: AsRef<str>>(
    arg: Option<&S>,
    name: &'static str,
) -> Result<Option<usize>, ConfigError> {
    match arg {
        None => Ok(None),
        Some(raw) => raw
            .as_ref()
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber {
                name,
                value: raw.as_ref().to_string(),
            }),
    }
}

/// Usage text printed when the command line is rejected.
pub fn usage(program: &str) -> String {
    format!(
        "Usage: {program} <url> [requests] [concurrency]\n\
         Example: {program} http://localhost:3000/users 1000 50"
    )
}
