//! End-to-end integration tests

use async_trait::async_trait;
use price_feeder::cache::{PriceCache, SnapshotConfig};
use price_feeder::config::{Config, ScheduleMode};
use price_feeder::decision::DecisionEngine;
use price_feeder::destination::{DestinationGateway, DestinationReading, PriceDestination, PriceUpdate};
use price_feeder::error::RelayError;
use price_feeder::scheduler::{Feeder, Schedule, Scheduler};
use price_feeder::source::{PriceSource, RawQuote, RequestId, SourceGateway};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_config_example_loads() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    tokio_test::assert_ok!(config.validate());
    assert_eq!(config.feeder.symbols, vec!["BTC", "ETH"]);
    assert_eq!(config.feeder.mode, ScheduleMode::Split);
    assert_eq!(config.feeder.decision().max_delay_secs, 3600);
}

#[test]
fn test_invalid_config_rejected() {
    let config: Config = toml::from_str(
        r#"
        [feeder]
        symbols = []
        "#,
    )
    .unwrap();
    tokio_test::assert_err!(config.validate());
}

/// Source whose price drifts upwards a little on every request
struct TickingSource {
    requests: AtomicI64,
}

#[async_trait]
impl PriceSource for TickingSource {
    async fn request_prices(&self, _symbols: &[String]) -> Result<RequestId, RelayError> {
        Ok(self.requests.fetch_add(1, Ordering::SeqCst))
    }

    async fn retrieve_prices(&self, id: RequestId) -> Result<Vec<RawQuote>, RelayError> {
        Ok(vec![RawQuote {
            symbol: "BTC".to_string(),
            px: (4_200_000 + id).to_string(),
            multiplier: "100".to_string(),
            resolve_time: (1_700_000_000 + id).to_string(),
            request_id: id.to_string(),
        }])
    }
}

#[derive(Default)]
struct CountingDestination {
    calls: AtomicUsize,
    stored: Mutex<HashMap<String, DestinationReading>>,
}

#[async_trait]
impl PriceDestination for CountingDestination {
    async fn update_prices(&self, update: &PriceUpdate) -> Result<(), RelayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut stored = self.stored.lock().unwrap();
        for (symbol, price) in update.symbols.iter().zip(&update.prices) {
            stored.insert(
                symbol.clone(),
                DestinationReading {
                    price: *price,
                    last_update: update.timestamp,
                },
            );
        }
        Ok(())
    }

    async fn read_price(&self, symbol: &str) -> Result<DestinationReading, RelayError> {
        self.stored
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .ok_or_else(|| RelayError::DestinationUnavailable(symbol.to_string()))
    }
}

async fn run_scheduled(mode: ScheduleMode) -> (Arc<CountingDestination>, Arc<PriceCache>) {
    let config = Config::default();
    let source = Arc::new(TickingSource {
        requests: AtomicI64::new(0),
    });
    let destination = Arc::new(CountingDestination::default());
    let cache = Arc::new(PriceCache::new());

    let feeder = Arc::new(Feeder::new(
        Arc::clone(&cache),
        SourceGateway::new(source, Duration::from_millis(1)),
        DestinationGateway::new(Arc::clone(&destination), Duration::ZERO),
        DecisionEngine::new(config.feeder.decision()),
        price_feeder::scheduler::FeederOptions {
            symbols: vec!["BTC".to_string()],
            ..Default::default()
        },
    ));

    let handle = Scheduler::start(
        Arc::clone(&feeder),
        Schedule {
            mode,
            fetch_interval: Duration::from_millis(20),
            push_interval: Duration::from_millis(30),
        },
    );
    assert!(handle.is_running());

    tokio::time::sleep(Duration::from_millis(300)).await;
    handle.stop();
    // Let in-flight cycles finish
    tokio::time::sleep(Duration::from_millis(50)).await;
    feeder.wait_for_immediate().await;

    (destination, cache)
}

#[tokio::test]
async fn test_split_schedule_relays_prices() {
    let (destination, cache) = run_scheduled(ScheduleMode::Split).await;

    // First sight is pushed once, later drift stays under the threshold
    assert!(destination.calls.load(Ordering::SeqCst) >= 1);
    let record = cache.get("BTC").unwrap();
    assert!(record.last_push_timestamp > 0);
    assert_eq!(destination.stored.lock().unwrap()["BTC"].last_update, record.pushed_source_timestamp);
}

#[tokio::test]
async fn test_combined_schedule_relays_prices() {
    let (destination, cache) = run_scheduled(ScheduleMode::Combined).await;

    assert!(destination.calls.load(Ordering::SeqCst) >= 1);
    assert!(cache.get("BTC").unwrap().last_push_timestamp > 0);
}

#[tokio::test]
async fn test_feed_once_then_restart_from_snapshot() {
    let dir = TempDir::new().unwrap();
    let snapshot = SnapshotConfig::new(dir.path().join("cache.json"), Duration::from_secs(60));
    let destination = Arc::new(CountingDestination::default());

    let cache = Arc::new(PriceCache::restore(&snapshot));
    let feeder = Feeder::new(
        Arc::clone(&cache),
        SourceGateway::new(
            Arc::new(TickingSource {
                requests: AtomicI64::new(0),
            }),
            Duration::from_millis(1),
        ),
        DestinationGateway::new(Arc::clone(&destination), Duration::ZERO),
        DecisionEngine::default(),
        price_feeder::scheduler::FeederOptions {
            symbols: vec!["BTC".to_string()],
            ..Default::default()
        },
    );
    feeder.feed_once().await.unwrap();
    cache.flush(&snapshot.path).unwrap();
    assert_eq!(destination.calls.load(Ordering::SeqCst), 1);

    // After a restart the symbol is known and recently pushed: small drift is skipped
    let restored = Arc::new(PriceCache::restore(&snapshot));
    let feeder = Feeder::new(
        restored,
        SourceGateway::new(
            Arc::new(TickingSource {
                requests: AtomicI64::new(5),
            }),
            Duration::from_millis(1),
        ),
        DestinationGateway::new(Arc::clone(&destination), Duration::ZERO),
        DecisionEngine::default(),
        price_feeder::scheduler::FeederOptions {
            symbols: vec!["BTC".to_string()],
            ..Default::default()
        },
    );
    let (fetched, pushed) = feeder.feed_once().await.unwrap();
    assert_eq!(fetched.skipped, vec!["BTC"]);
    assert!(pushed.pushed.is_empty());
    assert_eq!(destination.calls.load(Ordering::SeqCst), 1);
}
