//! Integration tests for the feeder cycles over mock transports

use async_trait::async_trait;
use price_feeder::cache::PriceCache;
use price_feeder::decision::{DecisionConfig, DecisionEngine};
use price_feeder::destination::{DestinationGateway, DestinationReading, PriceDestination, PriceUpdate};
use price_feeder::error::RelayError;
use price_feeder::scheduler::{Feeder, FeederOptions};
use price_feeder::source::{PriceSource, RawQuote, RequestId, SourceGateway};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct ScriptedSource {
    quotes: Mutex<Vec<RawQuote>>,
}

impl ScriptedSource {
    fn quote(&self, prices: &[(&str, f64, i64)]) {
        *self.quotes.lock().unwrap() = prices
            .iter()
            .map(|(symbol, price, ts)| RawQuote {
                symbol: symbol.to_string(),
                // Source scales prices by 10^4
                px: format!("{}", (price * 10_000.0).round() as i64),
                multiplier: "10000".to_string(),
                resolve_time: ts.to_string(),
                request_id: "1".to_string(),
            })
            .collect();
    }
}

#[async_trait]
impl PriceSource for ScriptedSource {
    async fn request_prices(&self, _symbols: &[String]) -> Result<RequestId, RelayError> {
        Ok(1)
    }

    async fn retrieve_prices(&self, _id: RequestId) -> Result<Vec<RawQuote>, RelayError> {
        Ok(self.quotes.lock().unwrap().clone())
    }
}

#[derive(Default)]
struct RecordingDestination {
    calls: Mutex<Vec<PriceUpdate>>,
    stored: Mutex<HashMap<String, DestinationReading>>,
    rejected: Mutex<HashSet<String>>,
    distorted: Mutex<HashSet<String>>,
}

impl RecordingDestination {
    fn reject(&self, symbol: &str) {
        self.rejected.lock().unwrap().insert(symbol.to_string());
    }

    /// Store a different price than the one pushed
    fn distort(&self, symbol: &str) {
        self.distorted.lock().unwrap().insert(symbol.to_string());
    }

    fn accept_all(&self) {
        self.rejected.lock().unwrap().clear();
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PriceDestination for RecordingDestination {
    async fn update_prices(&self, update: &PriceUpdate) -> Result<(), RelayError> {
        self.calls.lock().unwrap().push(update.clone());
        let rejected = self.rejected.lock().unwrap();
        if update.symbols.iter().any(|s| rejected.contains(s)) {
            return Err(RelayError::DestinationUnavailable("rejected".to_string()));
        }
        let distorted = self.distorted.lock().unwrap();
        let mut stored = self.stored.lock().unwrap();
        for (symbol, price) in update.symbols.iter().zip(&update.prices) {
            let price = if distorted.contains(symbol) { price * 2.0 } else { *price };
            stored.insert(
                symbol.clone(),
                DestinationReading {
                    price,
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

struct Setup {
    feeder: Feeder<ScriptedSource, RecordingDestination>,
    source: Arc<ScriptedSource>,
    destination: Arc<RecordingDestination>,
    now: Arc<AtomicI64>,
}

fn setup(symbols: &[&str], enable_recheck: bool) -> Setup {
    let source = Arc::new(ScriptedSource::default());
    let destination = Arc::new(RecordingDestination::default());
    let now = Arc::new(AtomicI64::new(1_000_000));
    let clock = Arc::clone(&now);

    let feeder = Feeder::new(
        Arc::new(PriceCache::new()),
        SourceGateway::new(Arc::clone(&source), Duration::from_millis(1)),
        DestinationGateway::new(Arc::clone(&destination), Duration::ZERO),
        DecisionEngine::new(DecisionConfig::default()),
        FeederOptions {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            enable_recheck,
            seed_from_destination: false,
        },
    )
    .with_clock(Arc::new(move || clock.load(Ordering::SeqCst)));

    Setup {
        feeder,
        source,
        destination,
        now,
    }
}

#[tokio::test]
async fn test_relay_lifecycle() {
    let s = setup(&["BTC", "ETH"], true);

    // First sight: both batched and pushed together
    s.source.quote(&[("BTC", 42_000.0, 999_990), ("ETH", 2_500.0, 999_990)]);
    let (fetched, pushed) = s.feeder.feed_once().await.unwrap();
    assert_eq!(fetched.batched.len(), 2);
    assert_eq!(pushed.pushed, vec!["BTC", "ETH"]);
    assert!(pushed.mismatched.is_empty());
    assert_eq!(s.destination.call_count(), 1);

    // 1% move on BTC, 0.04% on ETH: nothing to do
    s.now.fetch_add(60, Ordering::SeqCst);
    s.source.quote(&[("BTC", 42_420.0, 1_000_050), ("ETH", 2_501.0, 1_000_050)]);
    let (fetched, pushed) = s.feeder.feed_once().await.unwrap();
    assert_eq!(fetched.skipped, vec!["BTC", "ETH"]);
    assert!(pushed.pushed.is_empty());
    assert_eq!(s.destination.call_count(), 1);

    // 20% crash on ETH goes out immediately
    s.now.fetch_add(60, Ordering::SeqCst);
    s.source.quote(&[("BTC", 42_420.0, 1_000_110), ("ETH", 2_000.0, 1_000_110)]);
    let (fetched, _) = s.feeder.feed_once().await.unwrap();
    assert_eq!(fetched.immediate, vec!["ETH"]);
    assert_eq!(s.destination.stored.lock().unwrap()["ETH"].price, 2_000.0);
    let eth = s.feeder.cache().get("ETH").unwrap();
    assert_eq!(eth.pushed_source_timestamp, 1_000_110);
    assert_eq!(eth.last_push_timestamp, 1_000_120);

    // An hour later everything is stale and re-sent
    s.now.fetch_add(3_600, Ordering::SeqCst);
    s.source.quote(&[("BTC", 42_420.0, 1_003_710), ("ETH", 2_000.0, 1_003_710)]);
    let (fetched, pushed) = s.feeder.feed_once().await.unwrap();
    assert_eq!(fetched.batched, vec!["BTC", "ETH"]);
    assert_eq!(pushed.pushed, vec!["BTC", "ETH"]);
}

#[tokio::test]
async fn test_mixed_timestamps_pushed_in_groups() {
    let s = setup(&["A", "B", "C"], false);
    s.source.quote(&[("A", 1.0, 999_990), ("B", 2.0, 999_990), ("C", 3.0, 999_995)]);

    let (_, pushed) = s.feeder.feed_once().await.unwrap();
    assert_eq!(pushed.pushed, vec!["A", "B", "C"]);

    let calls = s.destination.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].symbols, vec!["A", "B"]);
    assert_eq!(calls[0].timestamp, 999_990);
    assert_eq!(calls[1].symbols, vec!["C"]);
}

#[tokio::test]
async fn test_rejected_group_left_unconfirmed() {
    let s = setup(&["A", "B"], false);
    s.destination.reject("A");
    s.source.quote(&[("A", 1.0, 999_990), ("B", 2.0, 999_990)]);

    let (_, pushed) = s.feeder.feed_once().await.unwrap();
    assert!(pushed.pushed.is_empty());
    assert!(pushed.error.is_some());
    for symbol in ["A", "B"] {
        let record = s.feeder.cache().get(symbol).unwrap();
        assert_eq!(record.last_push_timestamp, 0);
        assert!(record.changed_since_push());
    }

    // Next push cycle delivers the re-queued group
    s.destination.accept_all();
    let pushed = s.feeder.push_cycle().await;
    assert_eq!(pushed.pushed, vec!["A", "B"]);
    assert!(s.feeder.pending().is_empty());
}

#[tokio::test]
async fn test_failed_immediate_falls_back_to_batch() {
    let s = setup(&["BTC"], false);
    s.source.quote(&[("BTC", 100.0, 999_990)]);
    s.feeder.feed_once().await.unwrap();

    s.destination.reject("BTC");
    s.source.quote(&[("BTC", 150.0, 999_995)]);
    let (fetched, _) = s.feeder.feed_once().await.unwrap();
    assert_eq!(fetched.immediate, vec!["BTC"]);
    assert!(s.feeder.pending().contains("BTC"));

    s.destination.accept_all();
    let pushed = s.feeder.push_cycle().await;
    assert_eq!(pushed.pushed, vec!["BTC"]);
    assert_eq!(s.destination.stored.lock().unwrap()["BTC"].price, 150.0);
}

#[tokio::test]
async fn test_recheck_flags_drift() {
    let s = setup(&["BTC", "ETH"], true);
    s.destination.distort("ETH");
    s.source.quote(&[("BTC", 100.0, 999_990), ("ETH", 10.0, 999_990)]);

    let (_, pushed) = s.feeder.feed_once().await.unwrap();
    assert_eq!(pushed.pushed, vec!["BTC", "ETH"]);
    assert_eq!(pushed.mismatched, vec!["ETH"]);
    // Recheck only reports; the push stays confirmed
    assert_eq!(s.feeder.cache().get("ETH").unwrap().pushed_source_timestamp, 999_990);
}

#[tokio::test]
async fn test_destination_tracks_slow_drift() {
    let s = setup(&["BTC"], false);
    let threshold = 0.1;

    s.source.quote(&[("BTC", 100.0, 999_990)]);
    s.feeder.feed_once().await.unwrap();

    let mut price = 100.0_f64;
    let mut immediate_pushes = 0;
    for step in 1..=5 {
        price = (price * 1.08 * 100.0).round() / 100.0;
        s.now.fetch_add(60, Ordering::SeqCst);
        s.source.quote(&[("BTC", price, 999_990 + step * 60)]);

        let (fetched, _) = s.feeder.feed_once().await.unwrap();
        immediate_pushes += fetched.immediate.len();

        let at_destination = s.destination.stored.lock().unwrap()["BTC"].price;
        let lag = ((price - at_destination) / price).abs();
        assert!(
            lag <= threshold,
            "step {}: destination {} lags fresh {} by {:.3}",
            step,
            at_destination,
            price,
            lag
        );
    }
    assert!(immediate_pushes >= 2);
}
