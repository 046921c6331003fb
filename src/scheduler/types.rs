//! Scheduler types

use crate::error::RelayError;
use std::fmt;

/// Which cycle a timer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    Fetch,
    Push,
    /// Fetch followed by push on a single timer
    Combined,
}

impl CycleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleKind::Fetch => "fetch",
            CycleKind::Push => "push",
            CycleKind::Combined => "combined",
        }
    }
}

impl fmt::Display for CycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a fetch cycle decided, by symbol
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchReport {
    pub skipped: Vec<String>,
    pub batched: Vec<String>,
    pub immediate: Vec<String>,
}

impl FetchReport {
    /// Number of symbols classified
    pub fn observed(&self) -> usize {
        self.skipped.len() + self.batched.len() + self.immediate.len()
    }
}

/// What a push cycle delivered
#[derive(Debug, Default)]
pub struct PushReport {
    pub pushed: Vec<String>,
    /// Symbols whose group failed; re-queued for the next push cycle
    pub failed: Vec<String>,
    /// Symbols the recheck found out of sync
    pub mismatched: Vec<String>,
    /// Last group failure, if any
    pub error: Option<RelayError>,
}
