use clap::Parser;
use price_feeder::cli::{Cli, Commands};
use price_feeder::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
            eprintln!("Using default configuration");
            toml::from_str(include_str!("../config.toml.example"))?
        }
    };
    config.validate()?;

    // Initialize telemetry
    price_feeder::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!(symbols = ?config.feeder.symbols, "Starting price relay");
            args.execute(&config).await?;
        }
        Commands::FeedOnce(args) => {
            tracing::info!(symbols = ?config.feeder.symbols, "Running a single feed cycle");
            args.execute(&config).await?;
        }
        Commands::Status(args) => {
            args.execute(&config)?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Symbols: {}", config.feeder.symbols.join(", "));
            println!(
                "  Schedule: {:?} (fetch {}s, push {}s, wait {}s)",
                config.feeder.mode,
                config.feeder.fetch_interval_secs,
                config.feeder.push_interval_secs,
                config.feeder.wait_secs
            );
            println!(
                "  Decision: max delay {}s, threshold {}%, first sight {:?}, stale {:?}",
                config.feeder.max_delay_secs,
                config.feeder.diff_threshold * 100.0,
                config.feeder.first_sight,
                config.feeder.stale
            );
            println!("  Source: {}", config.source.request_url);
            println!("  Destination: {}", config.destination.update_url);
            println!("  Snapshot: {}", config.cache.snapshot_path.display());
        }
    }

    Ok(())
}
