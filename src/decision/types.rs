//! Decision engine types

use serde::{Deserialize, Serialize};
use std::fmt;

/// What to do with a freshly fetched price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Destination is close enough, withhold
    Skip,
    /// Send with the next push cycle
    Batch,
    /// Send now, outside the push cycle
    Immediate,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Skip => "skip",
            Action::Batch => "batch",
            Action::Immediate => "immediate",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispatch policy for a non-urgent trigger (first sight or staleness)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dispatch {
    #[default]
    Batch,
    Immediate,
}

impl From<Dispatch> for Action {
    fn from(d: Dispatch) -> Self {
        match d {
            Dispatch::Batch => Action::Batch,
            Dispatch::Immediate => Action::Immediate,
        }
    }
}

/// Thresholds and policies used by [`super::DecisionEngine`]
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionConfig {
    /// Maximum seconds since the last push before a refresh is due
    pub max_delay_secs: i64,
    /// Relative price change that forces an immediate push
    pub diff_threshold: f64,
    /// Action for a symbol with no cached record
    pub first_sight: Dispatch,
    /// Action once `max_delay_secs` has elapsed
    pub stale: Dispatch,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            max_delay_secs: 3600,
            diff_threshold: 0.1,
            first_sight: Dispatch::Batch,
            stale: Dispatch::Batch,
        }
    }
}
