//! Feed-once command implementation

use super::{build_feeder, flush_cache};
use crate::cache::PriceCache;
use crate::config::Config;
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct FeedOnceArgs {
    /// Do not write the cache snapshot afterwards
    #[arg(long)]
    pub no_flush: bool,
}

impl FeedOnceArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let cache = Arc::new(PriceCache::restore(&config.cache.snapshot()));
        let feeder = build_feeder(config, Arc::clone(&cache))?;

        let (fetched, pushed) = feeder.feed_once().await?;
        println!(
            "Observed {} symbols: {} skipped, {} batched, {} immediate",
            fetched.observed(),
            fetched.skipped.len(),
            fetched.batched.len(),
            fetched.immediate.len()
        );
        println!("Pushed: {}", pushed.pushed.join(", "));
        if !pushed.failed.is_empty() {
            println!("Failed: {}", pushed.failed.join(", "));
        }

        if !self.no_flush {
            flush_cache(&cache, config);
        }

        match pushed.error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
