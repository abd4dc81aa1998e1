//! Error types and failure categorization.
//!
//! Request failures never abort a run; they are classified here so the final
//! report can break them down by kind. Command-line problems are the only
//! fatal errors and are described by [`ConfigError`].

use std::fmt;

use thiserror::Error;

/// Fatal problems with the command line, reported before any request is sent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required argument: <url>")]
    MissingUrl,

    #[error("invalid value for {name}: '{value}' is not a non-negative integer")]
    InvalidNumber { name: &'static str, value: String },

    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
}

/// Categories of failed requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCategory {
    /// HTTP 4xx responses
    ClientError,

    /// HTTP 5xx responses
    ServerError,

    /// Responses outside 200/201 that are neither 4xx nor 5xx (204, 3xx, ...)
    UnexpectedStatus,

    /// DNS failures, refused connections, broken bodies
    NetworkError,

    /// The per-request timeout expired
    TimeoutError,

    /// TLS/SSL certificate errors
    TlsError,

    /// Anything else
    OtherError,
}

impl ErrorCategory {
    /// Categorize a response status code.
    ///
    /// Returns `None` for the two codes a write endpoint is expected to answer
    /// with: 200 and 201.
    pub fn from_status_code(status_code: u16) -> Option<Self> {
        match status_code {
            200 | 201 => None,
            400..=499 => Some(ErrorCategory::ClientError),
            500..=599 => Some(ErrorCategory::ServerError),
            _ => Some(ErrorCategory::UnexpectedStatus),
        }
    }

    /// Categorize a transport-level reqwest error.
    pub fn from_reqwest_error(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            return ErrorCategory::TimeoutError;
        }
        let message = error_chain(error);
        if error.is_connect() || error.is_request() || error.is_body() || error.is_decode() {
            Self::from_message(&message).unwrap_or(ErrorCategory::NetworkError)
        } else {
            Self::from_message(&message).unwrap_or(ErrorCategory::OtherError)
        }
    }

    fn from_message(message: &str) -> Option<Self> {
        let message = message.to_lowercase();
        if message.contains("certificate") || message.contains("tls") || message.contains("ssl") {
            Some(ErrorCategory::TlsError)
        } else if message.contains("timed out") || message.contains("timeout") {
            Some(ErrorCategory::TimeoutError)
        } else if message.contains("dns")
            || message.contains("resolve")
            || message.contains("connect")
            || message.contains("connection")
        {
            Some(ErrorCategory::NetworkError)
        } else {
            None
        }
    }

    /// Prometheus label for this category.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorCategory::ClientError => "client_error",
            ErrorCategory::ServerError => "server_error",
            ErrorCategory::UnexpectedStatus => "unexpected_status",
            ErrorCategory::NetworkError => "network_error",
            ErrorCategory::TimeoutError => "timeout_error",
            ErrorCategory::TlsError => "tls_error",
            ErrorCategory::OtherError => "other_error",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ErrorCategory::ClientError => "HTTP 4xx Client Errors",
            ErrorCategory::ServerError => "HTTP 5xx Server Errors",
            ErrorCategory::UnexpectedStatus => "Unexpected Status Codes",
            ErrorCategory::NetworkError => "Network/Connection Errors",
            ErrorCategory::TimeoutError => "Request Timeout Errors",
            ErrorCategory::TlsError => "TLS/SSL Certificate Errors",
            ErrorCategory::OtherError => "Other/Unknown Errors",
        }
    }

    /// All categories in report order.
    pub fn all() -> [ErrorCategory; 7] {
        [
            ErrorCategory::ClientError,
            ErrorCategory::ServerError,
            ErrorCategory::UnexpectedStatus,
            ErrorCategory::NetworkError,
            ErrorCategory::TimeoutError,
            ErrorCategory::TlsError,
            ErrorCategory::OtherError,
        ]
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.description())
    }
}

/// Renders an error together with its `source()` chain, joined by `": "`.
///
/// reqwest's top-level message only names the URL; the cause (refused
/// connection, DNS failure, timeout) lives further down the chain.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_codes_not_categorized() {
        assert_eq!(ErrorCategory::from_status_code(200), None);
        assert_eq!(ErrorCategory::from_status_code(201), None);
    }

    #[test]
    fn test_other_2xx_and_3xx_are_unexpected() {
        assert_eq!(
            ErrorCategory::from_status_code(204),
            Some(ErrorCategory::UnexpectedStatus)
        );
        assert_eq!(
            ErrorCategory::from_status_code(302),
            Some(ErrorCategory::UnexpectedStatus)
        );
    }

    #[test]
    fn test_4xx_and_5xx() {
        assert_eq!(
            ErrorCategory::from_status_code(409),
            Some(ErrorCategory::ClientError)
        );
        assert_eq!(
            ErrorCategory::from_status_code(503),
            Some(ErrorCategory::ServerError)
        );
    }

    #[test]
    fn test_message_heuristics() {
        assert_eq!(
            ErrorCategory::from_message("invalid peer certificate"),
            Some(ErrorCategory::TlsError)
        );
        assert_eq!(
            ErrorCategory::from_message("operation timed out"),
            Some(ErrorCategory::TimeoutError)
        );
        assert_eq!(
            ErrorCategory::from_message("Connection refused (os error 111)"),
            Some(ErrorCategory::NetworkError)
        );
        assert_eq!(ErrorCategory::from_message("something odd"), None);
    }

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "error sending request")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let err = Outer(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "Connection refused",
        ));
        assert_eq!(
            error_chain(&err),
            "error sending request: Connection refused"
        );
    }

    #[test]
    fn test_display_honors_width() {
        assert_eq!(
            format!("[{:<24}]", ErrorCategory::ServerError),
            "[HTTP 5xx Server Errors  ]"
        );
    }

    #[test]
    fn test_labels_are_unique() {
        let mut labels: Vec<_> = ErrorCategory::all().iter().map(|c| c.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), ErrorCategory::all().len());
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::InvalidNumber {
            name: "total_requests",
            value: "abc".to_string(),
        };
        assert!(err.to_string().contains("total_requests"));
        assert!(err.to_string().contains("abc"));
        assert_eq!(
            ConfigError::MissingUrl.to_string(),
            "missing required argument: <url>"
        );
    }
}
