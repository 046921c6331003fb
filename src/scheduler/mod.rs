//! Scheduler module
//!
//! Drives fetch and push cycles from timers. Each timer owns a lock: a tick
//! that finds the previous cycle of its kind still running is dropped, so
//! cycles of one kind never overlap. Panics are caught at the cycle
//! boundary and the timer keeps ticking.

mod feeder;
mod pending;
mod types;

pub use feeder::{Clock, Feeder, FeederOptions};
pub use pending::PendingUpdates;
pub use types::{CycleKind, FetchReport, PushReport};

use crate::config::ScheduleMode;
use crate::destination::PriceDestination;
use crate::source::PriceSource;
use crate::telemetry::{increment, CounterMetric};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::Instrument;
use uuid::Uuid;

/// Timer layout
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub mode: ScheduleMode,
    pub fetch_interval: Duration,
    pub push_interval: Duration,
}

/// Starts the cycle timers
pub struct Scheduler;

impl Scheduler {
    /// Start timers for `feeder`
    ///
    /// The first cycle runs one interval after start.
    pub fn start<S, D>(feeder: Arc<Feeder<S, D>>, schedule: Schedule) -> SchedulerHandle
    where
        S: PriceSource + 'static,
        D: PriceDestination + 'static,
    {
        let mut timers = Vec::new();

        match schedule.mode {
            ScheduleMode::Split => {
                let fetcher = Arc::clone(&feeder);
                timers.push(spawn_timer(CycleKind::Fetch, schedule.fetch_interval, move || {
                    let feeder = Arc::clone(&fetcher);
                    async move {
                        if let Err(e) = feeder.fetch_cycle().await {
                            tracing::error!(error = %e, "Fetch cycle failed");
                        }
                    }
                }));

                let pusher = Arc::clone(&feeder);
                timers.push(spawn_timer(CycleKind::Push, schedule.push_interval, move || {
                    let feeder = Arc::clone(&pusher);
                    async move {
                        feeder.push_cycle().await;
                    }
                }));
            }
            ScheduleMode::Combined => {
                timers.push(spawn_timer(CycleKind::Combined, schedule.fetch_interval, move || {
                    let feeder = Arc::clone(&feeder);
                    async move {
                        if let Err(e) = feeder.fetch_cycle().await {
                            tracing::error!(error = %e, "Fetch cycle failed");
                        }
                        // Failed pushes re-queued earlier still get their turn
                        feeder.push_cycle().await;
                    }
                }));
            }
        }

        tracing::info!(
            mode = ?schedule.mode,
            fetch_interval_secs = schedule.fetch_interval.as_secs_f64(),
            push_interval_secs = schedule.push_interval.as_secs_f64(),
            "Scheduler started"
        );
        SchedulerHandle { timers }
    }
}

/// Running timers
pub struct SchedulerHandle {
    timers: Vec<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Stop all timers
    ///
    /// Cycles already running are left to finish.
    pub fn stop(self) {
        for timer in &self.timers {
            timer.abort();
        }
        tracing::info!("Scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.timers.iter().any(|t| !t.is_finished())
    }
}

/// Tick `job` every `period`, skipping ticks while the previous run is busy
pub(crate) fn spawn_timer<F, Fut>(kind: CycleKind, period: Duration, job: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let busy = Arc::new(Mutex::new(()));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            let guard = match Arc::clone(&busy).try_lock_owned() {
                Ok(guard) => guard,
                Err(_) => {
                    tracing::debug!(cycle = %kind, "Previous cycle still running, skipping tick");
                    increment(CounterMetric::SkippedTicks, 1);
                    continue;
                }
            };

            let cycle_id = Uuid::new_v4();
            let span = tracing::info_span!("cycle", cycle = %kind, %cycle_id);
            let run = tokio::spawn(job().instrument(span));

            tokio::spawn(async move {
                // Held until the cycle ends, panicked or not
                let _guard = guard;
                if let Err(e) = run.await {
                    if e.is_panic() {
                        tracing::error!(cycle = %kind, %cycle_id, error = %e, "Cycle panicked");
                        increment(CounterMetric::RecoveredPanics, 1);
                    } else {
                        tracing::warn!(cycle = %kind, %cycle_id, "Cycle cancelled");
                    }
                }
            });
        }
    })
}
