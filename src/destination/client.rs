//! HTTP implementation of the price destination

use super::types::{DestinationReading, PriceUpdate};
use super::PriceDestination;
use crate::error::RelayError;
use crate::http::{HttpClient, HttpError};
use async_trait::async_trait;

/// Destination reached over HTTP
pub struct HttpDestination {
    http: HttpClient,
    update_url: String,
    read_url: String,
}

impl HttpDestination {
    pub fn new(http: HttpClient, update_url: impl Into<String>, read_url: impl Into<String>) -> Self {
        Self {
            http,
            update_url: update_url.into(),
            read_url: read_url.into(),
        }
    }
}

fn unavailable(e: HttpError) -> RelayError {
    RelayError::DestinationUnavailable(e.to_string())
}

#[async_trait]
impl PriceDestination for HttpDestination {
    async fn update_prices(&self, update: &PriceUpdate) -> Result<(), RelayError> {
        self.http
            .post_json_unit(&self.update_url, update)
            .await
            .map_err(unavailable)
    }

    async fn read_price(&self, symbol: &str) -> Result<DestinationReading, RelayError> {
        self.http
            .get_json(&self.read_url, &[("symbol", symbol)])
            .await
            .map_err(unavailable)
    }
}
