//! Update classification
//!
//! For each symbol on each fetch cycle the engine compares the fresh
//! observation with the cached record and decides whether the destination
//! must hear about it now, in the next push cycle, or not at all.
//!
//! Rules, first match wins:
//! 1. No cached record: `first_sight` policy
//! 2. `now - last_push >= max_delay`: `stale` policy
//! 3. `|(fresh - pushed) / fresh| > diff_threshold`: `Immediate`, where
//!    `pushed` is the price the destination last accepted
//! 4. Otherwise `Skip`
//!
//! A zero or non-finite price cannot produce a meaningful ratio and is
//! classified `Immediate`.

use super::{Action, DecisionConfig};
use crate::cache::PriceRecord;
use crate::error::RelayError;
use crate::observation::PriceObservation;

/// Relative change of `fresh` against `cached`, divided by the fresh price
///
/// Returns `None` when the ratio is undefined (zero or non-finite inputs).
pub fn diff_ratio(cached: f64, fresh: f64) -> Option<f64> {
    if fresh == 0.0 || !fresh.is_finite() || !cached.is_finite() {
        return None;
    }
    Some(((fresh - cached) / fresh).abs())
}

/// Stateless classifier over cached and fresh prices
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    config: DecisionConfig,
}

impl DecisionEngine {
    /// Create an engine with the given thresholds
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    /// Classify the action required for `fresh`
    ///
    /// Fails with `InvariantViolation` if `cached` belongs to a different
    /// symbol or the observation has no symbol.
    pub fn classify(
        &self,
        cached: Option<&PriceRecord>,
        fresh: &PriceObservation,
        now: i64,
    ) -> Result<Action, RelayError> {
        let symbol = fresh.symbol.as_str();
        if symbol.is_empty() {
            return Err(RelayError::InvariantViolation(
                "cannot classify an observation without a symbol".to_string(),
            ));
        }

        let cached = match cached {
            Some(record) => record,
            None => {
                let action = Action::from(self.config.first_sight);
                tracing::info!(symbol, %action, "First sight of symbol");
                return Ok(action);
            }
        };

        if cached.symbol != symbol {
            return Err(RelayError::InvariantViolation(format!(
                "cannot compare pricing of different symbols ({} and {})",
                cached.symbol, symbol
            )));
        }

        let since_push = now - cached.last_push_timestamp;
        if since_push >= self.config.max_delay_secs {
            let action = Action::from(self.config.stale);
            tracing::info!(
                symbol,
                since_push,
                max_delay = self.config.max_delay_secs,
                %action,
                "Destination price is stale"
            );
            return Ok(action);
        }

        let ratio = match diff_ratio(cached.pushed_price, fresh.price) {
            Some(r) => r,
            None => {
                tracing::warn!(
                    symbol,
                    pushed = cached.pushed_price,
                    fresh = fresh.price,
                    "Undefined price ratio, pushing immediately"
                );
                return Ok(Action::Immediate);
            }
        };

        if ratio > self.config.diff_threshold {
            tracing::info!(
                symbol,
                ratio,
                threshold = self.config.diff_threshold,
                "Price moved past threshold"
            );
            return Ok(Action::Immediate);
        }

        tracing::debug!(symbol, since_push, ratio, "No update needed");
        Ok(Action::Skip)
    }
}
