//! Destination gateway module
//!
//! Pushes grouped price updates to the destination service and optionally
//! reads the stored values back

mod batch;
mod client;
mod known;
mod types;

pub use batch::UpdateBatch;
pub use client::HttpDestination;
pub use known::KnownValues;
pub use types::{DestinationReading, PriceUpdate, PushOutcome};

use crate::cache::PriceCache;
use crate::error::RelayError;
use crate::telemetry::{increment, CounterMetric};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Relative tolerance when comparing a destination reading with the cache
const RECHECK_TOLERANCE: f64 = 1e-9;

/// Transport seam for the downstream destination
#[async_trait]
pub trait PriceDestination: Send + Sync {
    /// Store prices for every symbol in `update`
    async fn update_prices(&self, update: &PriceUpdate) -> Result<(), RelayError>;
    /// Read the value currently stored for `symbol`
    async fn read_price(&self, symbol: &str) -> Result<DestinationReading, RelayError>;
}

/// Batched pushes, recheck and last-known values over a [`PriceDestination`]
pub struct DestinationGateway<D: PriceDestination> {
    destination: Arc<D>,
    known: KnownValues,
}

impl<D: PriceDestination> DestinationGateway<D> {
    /// Create a gateway; `known_ttl` of zero disables last-known values
    pub fn new(destination: Arc<D>, known_ttl: Duration) -> Self {
        Self {
            destination,
            known: KnownValues::new(known_ttl),
        }
    }

    /// Push every group of `batch`, one call per timestamp
    ///
    /// A failed group is logged and skipped; the remaining groups are still
    /// attempted. Cache confirmation is left to the caller.
    pub async fn push(&self, batch: &UpdateBatch) -> PushOutcome {
        let mut outcome = PushOutcome::default();

        for update in batch.updates() {
            match self.destination.update_prices(&update).await {
                Ok(()) => {
                    tracing::info!(
                        symbols = ?update.symbols,
                        prices = ?update.prices,
                        timestamp = update.timestamp,
                        "Pushed prices to destination"
                    );
                    for (symbol, price) in update.symbols.iter().zip(&update.prices) {
                        self.known.insert(
                            symbol,
                            DestinationReading {
                                price: *price,
                                last_update: update.timestamp,
                            },
                        );
                    }
                    increment(CounterMetric::SymbolsPushed, update.symbols.len() as u64);
                    outcome.pushed.extend(update.symbols);
                }
                Err(e) => {
                    tracing::error!(
                        symbols = ?update.symbols,
                        timestamp = update.timestamp,
                        error = %e,
                        "Could not push price group"
                    );
                    increment(CounterMetric::PushFailures, 1);
                    outcome.error = Some(e);
                }
            }
        }

        outcome
    }

    /// Compare the destination's stored values with the cache
    ///
    /// Observability only: mismatches and read failures are logged and the
    /// mismatched symbols returned, nothing is retried.
    pub async fn recheck(&self, symbols: &[String], cache: &PriceCache) -> Vec<String> {
        let mut mismatched = Vec::new();

        for symbol in symbols {
            let record = match cache.get(symbol) {
                Some(r) => r,
                None => {
                    tracing::error!(symbol = %symbol, "Recheck: symbol missing from cache");
                    continue;
                }
            };

            let reading = match self.destination.read_price(symbol).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::error!(symbol = %symbol, error = %e, "Recheck: could not read destination");
                    continue;
                }
            };

            let price_matches = (reading.price - record.pushed_price).abs()
                <= RECHECK_TOLERANCE * record.pushed_price.abs().max(1.0);
            let time_matches = reading.last_update == record.pushed_source_timestamp;

            if price_matches && time_matches {
                tracing::info!(symbol = %symbol, "Recheck confirmed destination price");
            } else {
                tracing::error!(
                    symbol = %symbol,
                    pushed_price = record.pushed_price,
                    destination_price = reading.price,
                    pushed_timestamp = record.pushed_source_timestamp,
                    destination_timestamp = reading.last_update,
                    "Recheck: destination disagrees with cache"
                );
                increment(CounterMetric::RecheckMismatches, 1);
                mismatched.push(symbol.clone());
            }
        }

        mismatched
    }

    /// Value believed to be at the destination, read remotely when unknown
    /// or expired
    pub async fn known_value(&self, symbol: &str) -> Result<DestinationReading, RelayError> {
        if let Some(reading) = self.known.get(symbol) {
            return Ok(reading);
        }
        let reading = self.destination.read_price(symbol).await?;
        self.known.insert(symbol, reading);
        Ok(reading)
    }
}
