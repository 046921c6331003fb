//! Decision engine module
//!
//! Classifies each fetched price as skip, batch or immediate

mod engine;
mod types;

pub use engine::{diff_ratio, DecisionEngine};
pub use types::{Action, DecisionConfig, Dispatch};
