//! Integration tests for the shared price cache and its snapshot

use price_feeder::cache::{read_records, PriceCache, SnapshotConfig};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tasks_on_disjoint_symbols() {
    let cache = Arc::new(PriceCache::new());
    let mut tasks = Vec::new();

    for i in 0..64 {
        let cache = Arc::clone(&cache);
        tasks.push(tokio::spawn(async move {
            let symbol = format!("SYM{}", i);
            for round in 0..50 {
                cache.upsert(&symbol, i as f64 + round as f64, round).unwrap();
                tokio::task::yield_now().await;
            }
            cache.confirm_push(&symbol, 100, 49, i as f64 + 49.0).unwrap();
        }));
    }
    for task in tasks {
        tokio_test::assert_ok!(task.await);
    }

    assert_eq!(cache.len(), 64);
    for i in 0..64 {
        let record = cache.get(&format!("SYM{}", i)).unwrap();
        assert_eq!(record.price, i as f64 + 49.0);
        assert_eq!(record.source_timestamp, 49);
        assert_eq!(record.last_push_timestamp, 100);
        assert!(!record.changed_since_push());
    }
}

#[tokio::test]
async fn test_snapshot_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("cache.json");

    let cache = PriceCache::new();
    cache.upsert("BTC", 42_000.5, 1_700_000_000).unwrap();
    cache.upsert("ETH", 2_500.0, 1_700_000_000).unwrap();
    cache.confirm_push("BTC", 1_700_000_010, 1_700_000_000, 42_000.5).unwrap();
    tokio_test::assert_ok!(cache.flush(&path));

    let restored = PriceCache::restore(&SnapshotConfig::new(&path, Duration::from_secs(3600)));
    assert_eq!(restored.snapshot(), cache.snapshot());

    let records = read_records(&path).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].symbol, "BTC");
    assert_eq!(records[0].last_push_timestamp, 1_700_000_010);
}

#[test]
fn test_missing_snapshot_starts_empty() {
    let dir = TempDir::new().unwrap();
    let cache = PriceCache::restore(&SnapshotConfig::new(
        dir.path().join("absent.json"),
        Duration::from_secs(3600),
    ));
    assert!(cache.is_empty());
}

#[test]
fn test_corrupt_snapshot_starts_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.json");
    std::fs::write(&path, "{ not json").unwrap();

    let cache = PriceCache::restore(&SnapshotConfig::new(&path, Duration::from_secs(3600)));
    assert!(cache.is_empty());
    assert!(read_records(&path).is_err());
}
