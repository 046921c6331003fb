//! Source wire types and quote normalization

use crate::error::RelayError;
use crate::observation::PriceObservation;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifier returned by the source for an asynchronous price request
pub type RequestId = i64;

/// Body of the price request call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRequest {
    pub symbols: Vec<String>,
}

/// Response of the price request call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRequestResponse {
    pub id: RequestId,
}

/// One quote as delivered by the source, all numbers as decimal strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    pub symbol: String,
    /// Price scaled by `multiplier`
    pub px: String,
    pub multiplier: String,
    /// Epoch seconds when the source resolved the price
    pub resolve_time: String,
    #[serde(default)]
    pub request_id: String,
}

/// Response of the retrieval call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceResults {
    #[serde(default)]
    pub price_results: Vec<RawQuote>,
}

fn malformed(quote: &RawQuote, field: &'static str, value: &str) -> RelayError {
    RelayError::MalformedQuote {
        symbol: quote.symbol.clone(),
        field,
        value: value.to_string(),
    }
}

/// Exact `px / multiplier`, `None` for a zero multiplier or overflow
pub fn scaled_price(px: Decimal, multiplier: Decimal) -> Option<Decimal> {
    px.checked_div(multiplier)
}

/// Convert a raw quote into a typed observation
///
/// The effective price is `px / multiplier`, computed exactly before the
/// conversion to `f64`.
pub fn normalize(quote: &RawQuote) -> Result<PriceObservation, RelayError> {
    let px = Decimal::from_str(quote.px.trim()).map_err(|_| malformed(quote, "px", &quote.px))?;
    let multiplier = Decimal::from_str(quote.multiplier.trim())
        .map_err(|_| malformed(quote, "multiplier", &quote.multiplier))?;
    let timestamp = quote
        .resolve_time
        .trim()
        .parse::<i64>()
        .map_err(|_| malformed(quote, "resolve_time", &quote.resolve_time))?;

    let price = scaled_price(px, multiplier)
        .and_then(|p| p.to_f64())
        .ok_or_else(|| malformed(quote, "multiplier", &quote.multiplier))?;

    Ok(PriceObservation::new(quote.symbol.clone(), price, timestamp))
}
