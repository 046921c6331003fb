//! JSON snapshot persistence for the price cache

use super::{PriceCache, PriceRecord};
use crate::error::RelayError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Where the cache snapshot lives and how long it stays usable
#[derive(Debug, Clone)]
pub struct SnapshotConfig {
    /// JSON file path
    pub path: PathBuf,
    /// Snapshots last modified longer ago than this are ignored
    pub lifetime: Duration,
}

impl SnapshotConfig {
    pub fn new(path: impl Into<PathBuf>, lifetime: Duration) -> Self {
        Self {
            path: path.into(),
            lifetime,
        }
    }

    /// Whether the snapshot file exists and is younger than `lifetime`
    pub fn is_fresh(&self) -> bool {
        let modified = match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(_) => return false,
        };
        match SystemTime::now().duration_since(modified) {
            Ok(age) => age <= self.lifetime,
            // Modified in the future (clock skew): treat as just written
            Err(_) => true,
        }
    }
}

impl PriceCache {
    /// Open the cache from a snapshot, or start empty
    ///
    /// A missing, expired or unreadable snapshot yields an empty cache; only
    /// the reason is logged.
    pub fn restore(config: &SnapshotConfig) -> Self {
        if !config.is_fresh() {
            tracing::info!(path = ?config.path, "No fresh cache snapshot, starting empty");
            return Self::new();
        }

        match read_records(&config.path) {
            Ok(records) => {
                tracing::info!(
                    path = ?config.path,
                    symbols = records.len(),
                    "Restored cache snapshot"
                );
                Self::from_records(records)
            }
            Err(e) => {
                tracing::warn!(path = ?config.path, error = %e, "Ignoring unreadable cache snapshot");
                Self::new()
            }
        }
    }

    /// Write all records to `path` as pretty JSON
    pub fn flush(&self, path: &Path) -> Result<(), RelayError> {
        // Copy out first so the lock is not held during file I/O
        let records: BTreeMap<String, PriceRecord> = self
            .snapshot()
            .into_iter()
            .map(|r| (r.symbol.clone(), r))
            .collect();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(path, json)?;
        tracing::info!(path = ?path, symbols = records.len(), "Flushed cache snapshot");
        Ok(())
    }
}

/// Read a snapshot file regardless of its age
pub fn read_records(path: &Path) -> Result<Vec<PriceRecord>, RelayError> {
    let content = std::fs::read_to_string(path)?;
    let map: BTreeMap<String, PriceRecord> = serde_json::from_str(&content)?;

    map.into_iter()
        .map(|(key, record)| {
            if key != record.symbol {
                return Err(RelayError::Snapshot(format!(
                    "entry {} holds record for {}",
                    key, record.symbol
                )));
            }
            Ok(record)
        })
        .collect()
}
