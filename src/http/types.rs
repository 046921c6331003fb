//! HTTP transport types and configuration

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Retry and timeout settings for a remote endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Extra attempts after the first one (0 = single attempt)
    pub retry_count: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for the doubling retry delay
    pub max_delay: Duration,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retry_count: 1,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            timeout: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Set the number of retries
    pub fn retries(mut self, n: u32) -> Self {
        self.retry_count = n;
        self
    }

    /// Set initial retry delay
    pub fn initial_delay(mut self, d: Duration) -> Self {
        self.initial_delay = d;
        self
    }

    /// Set maximum retry delay
    pub fn max_delay(mut self, d: Duration) -> Self {
        self.max_delay = d;
        self
    }

    /// Set request timeout
    pub fn timeout(mut self, d: Duration) -> Self {
        self.timeout = d;
        self
    }

    /// Total attempts including the first
    pub fn attempts(&self) -> u32 {
        self.retry_count.saturating_add(1)
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.initial_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }
}

/// HTTP transport errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// The underlying client could not be constructed
    #[error("Could not build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    /// Could not send or read the request
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// Endpoint answered with a non-2xx status
    #[error("Unexpected status {status} from {url}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    /// Response body did not match the expected JSON shape
    #[error("Could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    /// Every attempt failed
    #[error("Giving up on {url} after {attempts} attempts: {last}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last: Box<HttpError>,
    },
}
