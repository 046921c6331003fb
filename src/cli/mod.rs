//! CLI interface for price-feeder
//!
//! Provides subcommands for:
//! - `run`: Relay prices on the configured schedule until interrupted
//! - `feed-once`: Run a single fetch and push cycle
//! - `status`: Show the cached prices from the snapshot
//! - `config`: Show the effective configuration

mod feed_once;
mod run;
mod status;

pub use feed_once::FeedOnceArgs;
pub use run::RunArgs;
pub use status::StatusArgs;

use crate::cache::PriceCache;
use crate::config::Config;
use crate::decision::DecisionEngine;
use crate::destination::{DestinationGateway, HttpDestination};
use crate::http::HttpClient;
use crate::scheduler::Feeder;
use crate::source::{HttpSource, SourceGateway};
use clap::{Parser, Subcommand};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "price-feeder")]
#[command(about = "Relays prices from an upstream source to a destination service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Relay prices until interrupted
    Run(RunArgs),
    /// Run one fetch cycle and one push cycle, then exit
    FeedOnce(FeedOnceArgs),
    /// Show cached prices
    Status(StatusArgs),
    /// Show configuration
    Config,
}

/// Feeder wired to the configured HTTP endpoints
pub type HttpFeeder = Feeder<HttpSource, HttpDestination>;

/// Wire the HTTP gateways, decision engine and `cache` from `config`
pub fn build_feeder(config: &Config, cache: Arc<PriceCache>) -> anyhow::Result<HttpFeeder> {
    let source_http = HttpClient::new(
        config
            .retry
            .policy(config.source.retry_count, config.source.timeout_secs),
    )?;
    let destination_http = HttpClient::new(
        config
            .retry
            .policy(config.destination.retry_count, config.destination.timeout_secs),
    )?;

    let source = HttpSource::new(
        source_http,
        config.source.request_url.as_str(),
        config.source.retrieve_url.as_str(),
    );
    let destination = HttpDestination::new(
        destination_http,
        config.destination.update_url.as_str(),
        config.destination.read_url.as_str(),
    );

    Ok(Feeder::new(
        cache,
        SourceGateway::new(Arc::new(source), config.feeder.wait()),
        DestinationGateway::new(Arc::new(destination), config.destination.known_value_ttl()),
        DecisionEngine::new(config.feeder.decision()),
        config.feeder.options(),
    ))
}

/// Persist the cache, logging instead of failing
pub fn flush_cache(cache: &PriceCache, config: &Config) {
    let path = &config.cache.snapshot_path;
    match cache.flush(path) {
        Ok(()) => tracing::info!(path = ?path, symbols = cache.len(), "Cache snapshot written"),
        Err(e) => tracing::error!(path = ?path, error = %e, "Could not write cache snapshot"),
    }
}
