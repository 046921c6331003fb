//! Prometheus metrics

use crate::decision::Action;
use std::time::Duration;

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Full fetch cycle (request, wait, retrieve, classify)
    FetchCycle,
    /// Full push cycle
    PushCycle,
    /// Single-symbol immediate push
    ImmediatePush,
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Symbols held by the price cache
    CachedSymbols,
    /// Symbols waiting for the next push cycle
    PendingSymbols,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Classification outcomes
    Decision(Action),
    /// Symbols accepted by the destination
    SymbolsPushed,
    /// Destination groups that failed
    PushFailures,
    /// Timer ticks dropped because the previous cycle was still running
    SkippedTicks,
    /// Panics caught at a cycle or task boundary
    RecoveredPanics,
    /// Recheck disagreements
    RecheckMismatches,
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let metric_name = match metric {
        LatencyMetric::FetchCycle => "feeder_fetch_cycle_seconds",
        LatencyMetric::PushCycle => "feeder_push_cycle_seconds",
        LatencyMetric::ImmediatePush => "feeder_immediate_push_seconds",
    };

    metrics::histogram!(metric_name).record(duration.as_secs_f64());
    tracing::trace!(
        metric = metric_name,
        value_ms = duration.as_millis() as u64,
        "Recording latency"
    );
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = match metric {
        GaugeMetric::CachedSymbols => "feeder_cached_symbols",
        GaugeMetric::PendingSymbols => "feeder_pending_symbols",
    };

    metrics::gauge!(metric_name).set(value);
}

/// Increment a counter
pub fn increment(metric: CounterMetric, value: u64) {
    match metric {
        CounterMetric::Decision(action) => {
            metrics::counter!("feeder_decisions_total", "action" => action.as_str()).increment(value)
        }
        CounterMetric::SymbolsPushed => metrics::counter!("feeder_symbols_pushed_total").increment(value),
        CounterMetric::PushFailures => metrics::counter!("feeder_push_failures_total").increment(value),
        CounterMetric::SkippedTicks => metrics::counter!("feeder_skipped_ticks_total").increment(value),
        CounterMetric::RecoveredPanics => {
            metrics::counter!("feeder_recovered_panics_total").increment(value)
        }
        CounterMetric::RecheckMismatches => {
            metrics::counter!("feeder_recheck_mismatches_total").increment(value)
        }
    }
}
