//! Last-known destination values with their own expiry

use super::types::DestinationReading;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Readings believed to be stored at the destination
///
/// Independent of the price cache's staleness threshold: entries expire
/// after `ttl`, and a zero `ttl` disables the cache entirely.
#[derive(Debug)]
pub struct KnownValues {
    ttl: Duration,
    entries: Mutex<HashMap<String, (DestinationReading, Instant)>>,
}

impl KnownValues {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Reading for `symbol` if one was stored less than `ttl` ago
    pub fn get(&self, symbol: &str) -> Option<DestinationReading> {
        if !self.is_enabled() {
            return None;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(symbol) {
            Some((reading, stored)) if stored.elapsed() < self.ttl => Some(*reading),
            Some(_) => {
                entries.remove(symbol);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, symbol: &str, reading: DestinationReading) {
        if !self.is_enabled() {
            return;
        }
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(symbol.to_string(), (reading, Instant::now()));
    }
}
