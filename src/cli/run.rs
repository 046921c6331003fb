//! Run command implementation

use super::{build_feeder, flush_cache};
use crate::cache::PriceCache;
use crate::config::Config;
use crate::scheduler::Scheduler;
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run one cycle immediately instead of waiting a full interval
    #[arg(long)]
    pub eager: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let cache = Arc::new(PriceCache::restore(&config.cache.snapshot()));
        let feeder = Arc::new(build_feeder(config, Arc::clone(&cache))?);

        if self.eager {
            if let Err(e) = feeder.feed_once().await {
                tracing::error!(error = %e, "Initial cycle failed");
            }
        }

        let handle = Scheduler::start(Arc::clone(&feeder), config.feeder.schedule());

        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown signal received");

        handle.stop();
        feeder.wait_for_immediate().await;
        flush_cache(&cache, config);
        Ok(())
    }
}
