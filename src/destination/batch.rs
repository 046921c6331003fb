//! Grouping of pending updates by timestamp

use super::types::PriceUpdate;
use crate::observation::PriceObservation;
use std::collections::BTreeMap;

/// Updates grouped by the timestamp they will be pushed with
///
/// Built fresh for every push and discarded afterwards. The destination
/// requires all symbols of a call to share one timestamp, so each key
/// becomes one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateBatch {
    groups: BTreeMap<i64, Vec<(String, f64)>>,
}

impl UpdateBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one observation to the group of its timestamp
    pub fn add(&mut self, observation: &PriceObservation) {
        self.groups
            .entry(observation.timestamp)
            .or_default()
            .push((observation.symbol.clone(), observation.price));
    }

    /// Number of symbols across all groups
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of destination calls this batch needs
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Wire payloads, ascending by timestamp
    pub fn updates(&self) -> Vec<PriceUpdate> {
        self.groups
            .iter()
            .map(|(timestamp, entries)| PriceUpdate {
                symbols: entries.iter().map(|(s, _)| s.clone()).collect(),
                prices: entries.iter().map(|(_, p)| *p).collect(),
                timestamp: *timestamp,
            })
            .collect()
    }
}

impl<'a> FromIterator<&'a PriceObservation> for UpdateBatch {
    fn from_iter<I: IntoIterator<Item = &'a PriceObservation>>(iter: I) -> Self {
        let mut batch = Self::new();
        for observation in iter {
            batch.add(observation);
        }
        batch
    }
}
