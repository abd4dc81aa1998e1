use std::time::Duration;

use tracing::info;

/// Configuration for building the HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Hard upper bound on a single request, connect through body
    pub request_timeout: Duration,

    /// Maximum idle connections to keep per host
    pub max_idle_per_host: usize,

    /// How long idle connections stay in the pool before cleanup
    pub idle_timeout: Duration,

    /// TCP keepalive duration
    pub tcp_keepalive: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_idle_per_host: 32,
            idle_timeout: Duration::from_secs(90),
            tcp_keepalive: Some(Duration::from_secs(60)),
        }
    }
}

impl ClientConfig {
    /// Apply this configuration to a reqwest ClientBuilder.
    pub fn apply_to_builder(&self, builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
        let mut builder = builder
            .timeout(self.request_timeout)
            .pool_max_idle_per_host(self.max_idle_per_host)
            .pool_idle_timeout(self.idle_timeout);

        if let Some(keepalive) = self.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        builder
    }
}

/// Builds a reqwest HTTP client shared by every worker.
pub fn build_client(
    config: &ClientConfig,
) -> Result<reqwest::Client, Box<dyn std::error::Error + Send + Sync>> {
    let client = config.apply_to_builder(reqwest::Client::builder()).build()?;

    info!(
        timeout = ?config.request_timeout,
        max_idle_per_host = config.max_idle_per_host,
        idle_timeout = ?config.idle_timeout,
        "HTTP client configured"
    );

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout_is_ten_seconds() {
        assert_eq!(
            ClientConfig::default().request_timeout,
            Duration::from_secs(10)
        );
    }

    #[test]
    fn test_build_client() {
        let config = ClientConfig {
            max_idle_per_host: 4,
            tcp_keepalive: None,
            ..ClientConfig::default()
        };
        assert!(build_client(&config).is_ok());
    }
}
