//! HTTP implementation of the price source

use super::types::{PriceRequest, PriceRequestResponse, PriceResults, RawQuote, RequestId};
use super::PriceSource;
use crate::error::RelayError;
use crate::http::{HttpClient, HttpError};
use async_trait::async_trait;

/// Source reached over HTTP
///
/// `request_url` accepts a POST with the symbol list and answers with a
/// request id; `retrieve_url/{id}` returns the resolved quotes.
pub struct HttpSource {
    http: HttpClient,
    request_url: String,
    retrieve_url: String,
}

impl HttpSource {
    pub fn new(http: HttpClient, request_url: impl Into<String>, retrieve_url: impl Into<String>) -> Self {
        Self {
            http,
            request_url: request_url.into(),
            retrieve_url: retrieve_url.into(),
        }
    }

    /// URL of the retrieval endpoint for a request id
    fn retrieval_url(&self, id: RequestId) -> String {
        format!("{}/{}", self.retrieve_url.trim_end_matches('/'), id)
    }
}

fn unavailable(e: HttpError) -> RelayError {
    RelayError::SourceUnavailable(e.to_string())
}

#[async_trait]
impl PriceSource for HttpSource {
    async fn request_prices(&self, symbols: &[String]) -> Result<RequestId, RelayError> {
        let body = PriceRequest {
            symbols: symbols.to_vec(),
        };
        let response: PriceRequestResponse = self
            .http
            .post_json(&self.request_url, &body)
            .await
            .map_err(unavailable)?;
        Ok(response.id)
    }

    async fn retrieve_prices(&self, id: RequestId) -> Result<Vec<RawQuote>, RelayError> {
        let url = self.retrieval_url(id);
        let results: PriceResults = self.http.get_json(&url, &[]).await.map_err(unavailable)?;
        Ok(results.price_results)
    }
}
