//! Price observation shared by every layer of the feeder

use serde::{Deserialize, Serialize};

/// A symbol's price at a given epoch-second timestamp
///
/// Produced by the source gateway, consumed by the decision engine,
/// stored by the cache and pushed to the destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Ticker symbol (e.g., "BTC")
    pub symbol: String,
    /// Price in quote currency
    pub price: f64,
    /// Epoch seconds when the source resolved this price
    pub timestamp: i64,
}

impl PriceObservation {
    /// Create a new observation
    pub fn new(symbol: impl Into<String>, price: f64, timestamp: i64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
        }
    }
}
