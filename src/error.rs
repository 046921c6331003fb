//! Error types for the feeder

use thiserror::Error;

/// Errors surfaced by the cache, gateways and decision engine
#[derive(Debug, Error)]
pub enum RelayError {
    /// Source transport failed after exhausting its retry budget
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),
    /// A numeric field in a source quote could not be parsed
    #[error("Malformed quote for {symbol}: {field}={value:?}")]
    MalformedQuote {
        symbol: String,
        field: &'static str,
        value: String,
    },
    /// A destination call failed after exhausting its retry budget
    #[error("Destination unavailable: {0}")]
    DestinationUnavailable(String),
    /// Symbol has never been observed
    #[error("Symbol not in cache: {0}")]
    CacheMiss(String),
    /// Caller broke a precondition (mismatched symbols, empty key)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    /// Snapshot could not be read or written
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl From<std::io::Error> for RelayError {
    fn from(e: std::io::Error) -> Self {
        Self::Snapshot(e.to_string())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        Self::Snapshot(e.to_string())
    }
}
