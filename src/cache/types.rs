//! Cache record types

use serde::{Deserialize, Serialize};

/// Last-known state of a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Ticker symbol this record belongs to
    pub symbol: String,
    /// Most recently observed price
    pub price: f64,
    /// Epoch seconds when the source resolved `price`
    pub source_timestamp: i64,
    /// Epoch seconds of the last successful destination push (0 = never)
    #[serde(default)]
    pub last_push_timestamp: i64,
    /// Source timestamp of the value that was last pushed (0 = never)
    #[serde(default)]
    pub pushed_source_timestamp: i64,
    /// Price the destination last accepted (0 = never)
    #[serde(default)]
    pub pushed_price: f64,
}

impl PriceRecord {
    /// Create a record for a symbol that has never been pushed
    pub fn observed(symbol: impl Into<String>, price: f64, source_timestamp: i64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            source_timestamp,
            last_push_timestamp: 0,
            pushed_source_timestamp: 0,
            pushed_price: 0.0,
        }
    }

    /// Whether the cached price differs from the last pushed one
    pub fn changed_since_push(&self) -> bool {
        self.pushed_source_timestamp != self.source_timestamp
    }
}
