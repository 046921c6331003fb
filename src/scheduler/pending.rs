//! Observations waiting for the next push cycle

use crate::observation::PriceObservation;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Latest batch-classified observation per symbol
#[derive(Debug, Default)]
pub struct PendingUpdates {
    entries: Mutex<BTreeMap<String, PriceObservation>>,
}

impl PendingUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, PriceObservation>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue an observation, replacing any older one for the same symbol
    pub fn insert(&self, observation: PriceObservation) {
        self.lock().insert(observation.symbol.clone(), observation);
    }

    /// Put back an observation whose push failed
    ///
    /// Ignored if a newer observation was queued in the meantime.
    pub fn requeue(&self, observation: PriceObservation) {
        let mut entries = self.lock();
        let newer_queued = entries
            .get(&observation.symbol)
            .is_some_and(|queued| queued.timestamp >= observation.timestamp);
        if !newer_queued {
            entries.insert(observation.symbol.clone(), observation);
        }
    }

    /// Drop a queued observation (superseded by an immediate push)
    pub fn remove(&self, symbol: &str) -> Option<PriceObservation> {
        self.lock().remove(symbol)
    }

    /// Take everything queued, sorted by symbol
    pub fn drain(&self) -> Vec<PriceObservation> {
        std::mem::take(&mut *self.lock()).into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.lock().contains_key(symbol)
    }
}
