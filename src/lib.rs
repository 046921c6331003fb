//! price-feeder: relays prices from an upstream source to a destination service
//!
//! This library provides the core components for:
//! - Price snapshots from the source's request / retrieve protocol
//! - A shared price cache persisted across restarts
//! - Skip / batch / immediate classification of every observation
//! - Grouped pushes and read-back checks against the destination
//! - Fetch and push cycles on non-overlapping timers
//! - Structured logging and Prometheus metrics

pub mod cache;
pub mod cli;
pub mod config;
pub mod decision;
pub mod destination;
pub mod error;
pub mod http;
pub mod observation;
pub mod scheduler;
pub mod source;
pub mod telemetry;
