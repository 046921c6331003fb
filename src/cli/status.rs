//! Status command implementation

use crate::cache::{read_records, PriceRecord};
use crate::config::Config;
use chrono::{DateTime, Utc};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Snapshot to read instead of the configured one
    #[arg(short, long)]
    pub snapshot: Option<PathBuf>,
}

impl StatusArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let path = self
            .snapshot
            .clone()
            .unwrap_or_else(|| config.cache.snapshot_path.clone());

        if !path.exists() {
            println!("price-feeder status");
            println!("  No cache snapshot at {}", path.display());
            return Ok(());
        }

        let records = read_records(&path)?;
        println!("price-feeder status ({} symbols)", records.len());
        for record in &records {
            println!("  {}", format_record(record));
        }
        Ok(())
    }
}

fn format_time(timestamp: i64) -> String {
    if timestamp == 0 {
        return "never".to_string();
    }
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string())
}

fn format_record(record: &PriceRecord) -> String {
    format!(
        "{:<8} price={} observed={} pushed={}{}",
        record.symbol,
        record.price,
        format_time(record.source_timestamp),
        format_time(record.last_push_timestamp),
        if record.changed_since_push() { " (unpushed)" } else { "" }
    )
}
