//! JSON-over-HTTP client with bounded retries

use super::types::{HttpError, RetryConfig};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Instant;
use tokio::time::sleep;

/// Thin reqwest wrapper that retries each call up to `retry_count` times
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: RetryConfig,
}

impl HttpClient {
    /// Create a client with the given retry policy
    pub fn new(config: RetryConfig) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(HttpError::Build)?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// GET `url` with query parameters and decode a JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, HttpError> {
        self.execute(url, || self.client.get(url).query(query), decode_json)
            .await
    }

    /// POST a JSON body to `url` and decode a JSON body
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, HttpError> {
        self.execute(url, || self.client.post(url).json(body), decode_json)
            .await
    }

    /// POST a JSON body to `url`; any 2xx counts as success, the body is not read as JSON
    pub async fn post_json_unit<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<(), HttpError> {
        self.execute(url, || self.client.post(url).json(body), discard_body)
            .await
    }

    /// Run the request built by `build` until it succeeds or attempts run out
    ///
    /// `decode` turns a 2xx body into the result; a decode failure counts as a
    /// failed attempt.
    async fn execute<T>(
        &self,
        url: &str,
        build: impl Fn() -> RequestBuilder,
        decode: fn(&str, String) -> Result<T, HttpError>,
    ) -> Result<T, HttpError> {
        let start = Instant::now();
        let attempts = self.config.attempts();
        let mut last_error = None;

        for attempt in 1..=attempts {
            tracing::debug!(url, attempt, "Sending request");

            match Self::send_once(url, build(), decode).await {
                Ok(value) => {
                    tracing::debug!(
                        url,
                        attempt,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Request succeeded"
                    );
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(url, attempt, max_attempts = attempts, error = %e, "Request failed");
                    last_error = Some(e);
                    if attempt < attempts {
                        sleep(self.config.delay_after(attempt)).await;
                    }
                }
            }
        }

        let last = last_error.unwrap_or_else(|| HttpError::Status {
            url: url.to_string(),
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: "no attempt made".to_string(),
        });

        Err(HttpError::RetriesExhausted {
            url: url.to_string(),
            attempts,
            last: Box::new(last),
        })
    }

    async fn send_once<T>(
        url: &str,
        request: RequestBuilder,
        decode: fn(&str, String) -> Result<T, HttpError>,
    ) -> Result<T, HttpError> {
        let request_err = |source| HttpError::Request {
            url: url.to_string(),
            source,
        };

        let response = request.send().await.map_err(request_err)?;
        let status = response.status();
        let body = response.text().await.map_err(request_err)?;

        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        tracing::trace!(url, body = %body, "Response body");
        decode(url, body)
    }
}

fn discard_body(_url: &str, _body: String) -> Result<(), HttpError> {
    Ok(())
}

fn decode_json<T: DeserializeOwned>(url: &str, body: String) -> Result<T, HttpError> {
    // Empty 2xx bodies decode as JSON null
    let text = if body.trim().is_empty() { "null" } else { body.as_str() };
    serde_json::from_str(text).map_err(|source| HttpError::Decode {
        url: url.to_string(),
        source,
    })
}
