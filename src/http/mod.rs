//! HTTP transport
//!
//! JSON requests with bounded retries, shared by the source and
//! destination gateways

mod client;
mod types;

pub use client::HttpClient;
pub use types::{HttpError, RetryConfig};
