//! Source gateway module
//!
//! Retrieves price snapshots from the upstream source using its
//! request / wait / retrieve protocol

mod client;
mod types;

pub use client::HttpSource;
pub use types::{normalize, scaled_price, PriceRequest, PriceRequestResponse, PriceResults, RawQuote, RequestId};

use crate::error::RelayError;
use crate::observation::PriceObservation;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Transport seam for the upstream price source
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Ask the source to resolve prices for `symbols`
    async fn request_prices(&self, symbols: &[String]) -> Result<RequestId, RelayError>;
    /// Fetch the quotes resolved for a previous request
    async fn retrieve_prices(&self, id: RequestId) -> Result<Vec<RawQuote>, RelayError>;
}

/// Drives a [`PriceSource`] and normalizes its quotes
pub struct SourceGateway<S: PriceSource> {
    source: Arc<S>,
    wait: Duration,
}

impl<S: PriceSource> SourceGateway<S> {
    /// Create a gateway waiting `wait` between request and retrieval
    pub fn new(source: Arc<S>, wait: Duration) -> Self {
        Self { source, wait }
    }

    /// Fetch one price snapshot for `symbols`
    ///
    /// Any malformed quote fails the whole snapshot. Duplicate symbols keep
    /// the last quote delivered.
    pub async fn fetch_snapshot(
        &self,
        symbols: &[String],
    ) -> Result<BTreeMap<String, PriceObservation>, RelayError> {
        if symbols.is_empty() {
            return Ok(BTreeMap::new());
        }

        let id = self.source.request_prices(symbols).await?;
        tracing::debug!(request_id = id, wait_ms = self.wait.as_millis() as u64, "Price request accepted");

        // The source resolves quotes out of band
        tokio::time::sleep(self.wait).await;

        let quotes = self.source.retrieve_prices(id).await?;
        let mut snapshot = BTreeMap::new();
        for quote in &quotes {
            let observation = normalize(quote)?;
            tracing::debug!(
                symbol = %observation.symbol,
                price = observation.price,
                timestamp = observation.timestamp,
                "Fetched price"
            );
            snapshot.insert(observation.symbol.clone(), observation);
        }

        tracing::info!(request_id = id, quotes = snapshot.len(), "Fetched price snapshot");
        Ok(snapshot)
    }
}
