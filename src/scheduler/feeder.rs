//! Fetch and push cycles over the cache, decision engine and gateways

use super::pending::PendingUpdates;
use super::types::{FetchReport, PushReport};
use crate::cache::PriceCache;
use crate::decision::{Action, DecisionEngine};
use crate::destination::{DestinationGateway, PriceDestination, UpdateBatch};
use crate::error::RelayError;
use crate::observation::PriceObservation;
use crate::source::{PriceSource, SourceGateway};
use crate::telemetry::{
    increment, record_latency, set_gauge, CounterMetric, GaugeMetric, LatencyMetric,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::{JoinError, JoinSet};

/// Wall clock in unix seconds
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

fn system_clock() -> Clock {
    Arc::new(|| Utc::now().timestamp())
}

/// Feeder behavior switches
#[derive(Debug, Clone, Default)]
pub struct FeederOptions {
    pub symbols: Vec<String>,
    /// Read back destination values after every push
    pub enable_recheck: bool,
    /// Seed unknown symbols from the destination before classifying
    pub seed_from_destination: bool,
}

/// Owns the relay state shared by fetch cycles, push cycles and
/// immediate push tasks
pub struct Feeder<S: PriceSource, D: PriceDestination> {
    cache: Arc<PriceCache>,
    source: SourceGateway<S>,
    destination: Arc<DestinationGateway<D>>,
    engine: DecisionEngine,
    options: FeederOptions,
    pending: Arc<PendingUpdates>,
    immediate: Mutex<JoinSet<()>>,
    /// Held for every destination write so pushes never interleave
    deliveries: Arc<Mutex<()>>,
    clock: Clock,
}

impl<S, D> Feeder<S, D>
where
    S: PriceSource + 'static,
    D: PriceDestination + 'static,
{
    pub fn new(
        cache: Arc<PriceCache>,
        source: SourceGateway<S>,
        destination: DestinationGateway<D>,
        engine: DecisionEngine,
        options: FeederOptions,
    ) -> Self {
        Self {
            cache,
            source,
            destination: Arc::new(destination),
            engine,
            options,
            pending: Arc::new(PendingUpdates::new()),
            immediate: Mutex::new(JoinSet::new()),
            deliveries: Arc::new(Mutex::new(())),
            clock: system_clock(),
        }
    }

    /// Replace the wall clock
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn cache(&self) -> &Arc<PriceCache> {
        &self.cache
    }

    pub fn pending(&self) -> &PendingUpdates {
        &self.pending
    }

    pub fn symbols(&self) -> &[String] {
        &self.options.symbols
    }

    /// Fetch one snapshot and classify every observation
    ///
    /// `Immediate` observations are pushed by background tasks, `Batch`
    /// observations wait for the next push cycle. The cache is updated with
    /// every observation regardless of the action.
    pub async fn fetch_cycle(&self) -> Result<FetchReport, RelayError> {
        let start = Instant::now();
        let snapshot = self.source.fetch_snapshot(&self.options.symbols).await?;
        let now = (self.clock)();
        let mut report = FetchReport::default();

        for observation in snapshot.into_values() {
            let symbol = observation.symbol.clone();

            if self.options.seed_from_destination && self.cache.get(&symbol).is_none() {
                self.seed(&symbol).await;
            }

            let cached = self.cache.get(&symbol);
            let action = self.engine.classify(cached.as_ref(), &observation, now)?;
            self.cache
                .upsert(&symbol, observation.price, observation.timestamp)?;
            increment(CounterMetric::Decision(action), 1);

            tracing::debug!(
                symbol = %symbol,
                price = observation.price,
                timestamp = observation.timestamp,
                %action,
                "Classified observation"
            );

            match action {
                Action::Skip => report.skipped.push(symbol),
                Action::Batch => {
                    self.pending.insert(observation);
                    report.batched.push(symbol);
                }
                Action::Immediate => {
                    // The immediate push supersedes anything queued
                    self.pending.remove(&symbol);
                    self.spawn_immediate(observation).await;
                    report.immediate.push(symbol);
                }
            }
        }

        self.reap_immediate().await;
        set_gauge(GaugeMetric::CachedSymbols, self.cache.len() as f64);
        set_gauge(GaugeMetric::PendingSymbols, self.pending.len() as f64);
        record_latency(LatencyMetric::FetchCycle, start.elapsed());

        tracing::info!(
            observed = report.observed(),
            skipped = report.skipped.len(),
            batched = report.batched.len(),
            immediate = report.immediate.len(),
            "Fetch cycle complete"
        );
        Ok(report)
    }

    /// Push everything queued by fetch cycles
    ///
    /// Observations no newer than what the destination already holds are
    /// dropped. Failed groups are re-queued unless a newer observation is
    /// waiting.
    pub async fn push_cycle(&self) -> PushReport {
        let start = Instant::now();
        let mut report = PushReport::default();
        let delivering = self.deliveries.lock().await;

        let queued: Vec<PriceObservation> = self
            .pending
            .drain()
            .into_iter()
            .filter(|observation| !already_delivered(&self.cache, observation))
            .collect();

        if queued.is_empty() {
            tracing::debug!("Nothing to push");
            set_gauge(GaugeMetric::PendingSymbols, self.pending.len() as f64);
            return report;
        }

        let batch: UpdateBatch = queued.iter().collect();
        let outcome = self.destination.push(&batch).await;
        let now = (self.clock)();

        for observation in queued {
            if outcome.pushed.contains(&observation.symbol) {
                confirm(&self.cache, &observation, now);
                report.pushed.push(observation.symbol);
            } else {
                report.failed.push(observation.symbol.clone());
                self.pending.requeue(observation);
            }
        }
        report.error = outcome.error;
        drop(delivering);

        if self.options.enable_recheck && !report.pushed.is_empty() {
            report.mismatched = self.destination.recheck(&report.pushed, &self.cache).await;
        }

        set_gauge(GaugeMetric::PendingSymbols, self.pending.len() as f64);
        record_latency(LatencyMetric::PushCycle, start.elapsed());

        match &report.error {
            None => tracing::info!(pushed = report.pushed.len(), "Push cycle complete"),
            Some(e) => tracing::warn!(
                pushed = report.pushed.len(),
                failed = ?report.failed,
                error = %e,
                "Push cycle completed with failures"
            ),
        }
        report
    }

    /// One fetch cycle, one push cycle, then wait for immediate pushes
    pub async fn feed_once(&self) -> Result<(FetchReport, PushReport), RelayError> {
        let fetched = self.fetch_cycle().await?;
        let pushed = self.push_cycle().await;
        self.wait_for_immediate().await;
        Ok((fetched, pushed))
    }

    /// Wait until every in-flight immediate push has finished
    pub async fn wait_for_immediate(&self) {
        let mut tasks = self.immediate.lock().await;
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                report_task_failure(e);
            }
        }
    }

    async fn seed(&self, symbol: &str) {
        match self.destination.known_value(symbol).await {
            Ok(reading) if reading.last_update > 0 => {
                let seeded = self
                    .cache
                    .upsert(symbol, reading.price, reading.last_update)
                    .and_then(|()| {
                        self.cache
                            .confirm_push(symbol, reading.last_update, reading.last_update, reading.price)
                            .map(|_| ())
                    });
                match seeded {
                    Ok(()) => tracing::info!(
                        symbol,
                        price = reading.price,
                        last_update = reading.last_update,
                        "Seeded cache from destination"
                    ),
                    Err(e) => tracing::warn!(symbol, error = %e, "Could not seed cache"),
                }
            }
            Ok(_) => tracing::debug!(symbol, "Destination has no value yet"),
            Err(e) => tracing::warn!(symbol, error = %e, "Could not read destination value"),
        }
    }

    async fn spawn_immediate(&self, observation: PriceObservation) {
        let cache = Arc::clone(&self.cache);
        let destination = Arc::clone(&self.destination);
        let pending = Arc::clone(&self.pending);
        let deliveries = Arc::clone(&self.deliveries);
        let clock = Arc::clone(&self.clock);
        let recheck = self.options.enable_recheck;

        self.immediate.lock().await.spawn(async move {
            let start = Instant::now();
            let delivering = deliveries.lock().await;
            if already_delivered(&cache, &observation) {
                tracing::debug!(symbol = %observation.symbol, "Newer price already delivered");
                return;
            }

            let batch: UpdateBatch = std::iter::once(&observation).collect();
            let outcome = destination.push(&batch).await;

            if outcome.is_complete() {
                confirm(&cache, &observation, clock());
                drop(delivering);
                if recheck {
                    destination
                        .recheck(std::slice::from_ref(&observation.symbol), &cache)
                        .await;
                }
            } else {
                tracing::warn!(
                    symbol = %observation.symbol,
                    "Immediate push failed, falling back to next batch"
                );
                pending.requeue(observation);
            }
            record_latency(LatencyMetric::ImmediatePush, start.elapsed());
        });
    }

    /// Collect finished immediate pushes without waiting
    async fn reap_immediate(&self) {
        let mut tasks = self.immediate.lock().await;
        while let Some(result) = tasks.try_join_next() {
            if let Err(e) = result {
                report_task_failure(e);
            }
        }
    }
}

/// Whether the destination already holds this value or a newer one
fn already_delivered(cache: &PriceCache, observation: &PriceObservation) -> bool {
    cache.get(&observation.symbol).is_some_and(|record| {
        record.last_push_timestamp > 0 && record.pushed_source_timestamp >= observation.timestamp
    })
}

fn confirm(cache: &PriceCache, observation: &PriceObservation, now: i64) {
    match cache.confirm_push(&observation.symbol, now, observation.timestamp, observation.price) {
        Ok(true) => {}
        Ok(false) => tracing::warn!(
            symbol = %observation.symbol,
            timestamp = observation.timestamp,
            "Push confirmed after a newer one, keeping the newer"
        ),
        Err(e) => tracing::error!(symbol = %observation.symbol, error = %e, "Could not confirm push"),
    }
}

fn report_task_failure(e: JoinError) {
    if e.is_panic() {
        tracing::error!(error = %e, "Immediate push panicked");
        increment(CounterMetric::RecoveredPanics, 1);
    } else {
        tracing::warn!(error = %e, "Immediate push cancelled");
    }
}
