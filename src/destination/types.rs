//! Destination wire types

use crate::error::RelayError;
use serde::{Deserialize, Serialize};

/// One destination update call: every symbol shares `timestamp`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub symbols: Vec<String>,
    pub prices: Vec<f64>,
    pub timestamp: i64,
}

/// Value stored by the destination for one symbol
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DestinationReading {
    pub price: f64,
    pub last_update: i64,
}

/// Result of pushing an [`super::UpdateBatch`]
///
/// Partial success is normal: `pushed` lists every symbol whose group was
/// accepted, `error` holds the last group failure if any.
#[derive(Debug, Default)]
pub struct PushOutcome {
    pub pushed: Vec<String>,
    pub error: Option<RelayError>,
}

impl PushOutcome {
    /// Whether every group was accepted
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}
