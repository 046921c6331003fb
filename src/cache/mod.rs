//! Price cache
//!
//! In-memory map from symbol to its last-known price and push state.
//! Every operation takes the single map lock for a constant amount of work
//! and never performs I/O while holding it.

mod snapshot;
mod types;

pub use snapshot::{read_records, SnapshotConfig};
pub use types::PriceRecord;

use crate::error::RelayError;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Thread-safe symbol → record map
#[derive(Debug, Default)]
pub struct PriceCache {
    records: Mutex<HashMap<String, PriceRecord>>,
}

impl PriceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache pre-populated with records
    pub fn from_records(records: impl IntoIterator<Item = PriceRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|r| (r.symbol.clone(), r))
            .collect::<HashMap<_, _>>();
        Self {
            records: Mutex::new(map),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PriceRecord>> {
        // Critical sections never panic midway, so a poisoned map is still consistent
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get the record for a symbol, `None` if it was never observed
    pub fn get(&self, symbol: &str) -> Option<PriceRecord> {
        self.lock().get(symbol).cloned()
    }

    /// Overwrite price and source timestamp, keeping push-tracking fields
    pub fn upsert(&self, symbol: &str, price: f64, source_timestamp: i64) -> Result<(), RelayError> {
        if symbol.is_empty() {
            return Err(RelayError::InvariantViolation(
                "cannot cache a price under an empty symbol".to_string(),
            ));
        }

        let mut records = self.lock();
        match records.get_mut(symbol) {
            Some(record) => {
                record.price = price;
                record.source_timestamp = source_timestamp;
            }
            None => {
                records.insert(
                    symbol.to_string(),
                    PriceRecord::observed(symbol, price, source_timestamp),
                );
            }
        }
        Ok(())
    }

    /// Record a successful destination push for a previously observed symbol
    ///
    /// Returns `false` when the confirmation is for an older source value
    /// than the one already confirmed; the record is then left untouched.
    /// `last_push_timestamp` never moves backwards.
    pub fn confirm_push(
        &self,
        symbol: &str,
        push_timestamp: i64,
        pushed_source_timestamp: i64,
        pushed_price: f64,
    ) -> Result<bool, RelayError> {
        let mut records = self.lock();
        let record = records
            .get_mut(symbol)
            .ok_or_else(|| RelayError::CacheMiss(symbol.to_string()))?;

        if pushed_source_timestamp < record.pushed_source_timestamp {
            return Ok(false);
        }
        record.last_push_timestamp = record.last_push_timestamp.max(push_timestamp);
        record.pushed_source_timestamp = pushed_source_timestamp;
        record.pushed_price = pushed_price;
        Ok(true)
    }

    /// Copy of all records, sorted by symbol
    pub fn snapshot(&self) -> Vec<PriceRecord> {
        let mut records: Vec<PriceRecord> = self.lock().values().cloned().collect();
        records.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        records
    }

    /// Number of cached symbols
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no symbol has been cached yet
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
