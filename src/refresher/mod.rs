//! Background refresh module
//!
//! Drives periodic fetch-and-publish cycles against a QuoteSource:
//! `Idle -> Fetching -> (Publishing | Failed) -> Idle` until stopped.
//! Exactly one cycle runs at a time; a cycle that overruns the interval
//! delays the next one instead of overlapping it.

mod backoff;
mod types;

pub use backoff::Backoff;
pub use types::{
    CycleOutcome, CycleReport, RefreshConfig, RefreshError, RefreshState, StopOutcome,
};

use crate::cache::{IndexQuote, QuoteCache, Snapshot};
use crate::quote::{Quote, QuoteStatus, Symbol, TrackedIndex};
use crate::source::{FetchResults, QuoteSource};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Buffered cycle reports per subscriber
const REPORT_CAPACITY: usize = 64;

/// Periodically fetches quotes and publishes snapshots into the cache
pub struct Refresher<S: QuoteSource> {
    source: Arc<S>,
    cache: Arc<QuoteCache>,
    indices: Vec<TrackedIndex>,
    symbols: Vec<Symbol>,
    config: RefreshConfig,
    cycles: u64,
    state_tx: watch::Sender<RefreshState>,
}

impl<S: QuoteSource + 'static> Refresher<S> {
    /// Create a refresher for the given indices
    pub fn new(
        source: Arc<S>,
        cache: Arc<QuoteCache>,
        indices: Vec<TrackedIndex>,
        config: RefreshConfig,
    ) -> Self {
        let symbols = indices.iter().map(|i| i.symbol.clone()).collect();
        let (state_tx, _) = watch::channel(RefreshState::Idle);

        Self {
            source,
            cache,
            indices,
            symbols,
            config,
            cycles: 0,
            state_tx,
        }
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// Current loop state
    pub fn state(&self) -> RefreshState {
        *self.state_tx.borrow()
    }

    fn set_state(&self, state: RefreshState) {
        self.state_tx.send_replace(state);
    }

    /// Run one fetch-and-publish cycle
    ///
    /// Whole-cycle failures leave the cache untouched and are only reported
    /// in the returned `CycleReport`.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycles += 1;
        let started_at = Utc::now();
        let start = Instant::now();

        tracing::debug!(cycle = self.cycles, symbols = self.symbols.len(), "Refresh cycle starting");
        self.set_state(RefreshState::Fetching);

        let outcome = match self.fetch().await {
            Ok(results) => {
                self.set_state(RefreshState::Publishing);
                let snapshot = self.build_snapshot(results);
                let outcome = CycleOutcome::Published {
                    fresh: snapshot.available_count(),
                    unavailable: snapshot.unavailable_symbols(),
                };
                self.cache.publish(snapshot);
                self.set_state(RefreshState::Idle);
                outcome
            }
            Err(error) => {
                self.set_state(RefreshState::Failed);
                CycleOutcome::Failed { error }
            }
        };

        CycleReport {
            cycle: self.cycles,
            started_at,
            elapsed: start.elapsed(),
            outcome,
        }
    }

    /// Call the source, bounded by the fetch timeout
    async fn fetch(&self) -> Result<FetchResults, RefreshError> {
        let fetch = self.source.fetch(&self.symbols);

        let result = match self.config.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| RefreshError::Timeout(limit))?,
            None => fetch.await,
        };

        result.map_err(|e| RefreshError::Source(e.to_string()))
    }

    /// Build a snapshot, degrading failed or missing symbols to unavailable
    fn build_snapshot(&self, mut results: FetchResults) -> Snapshot {
        let basis = self.config.change_basis;

        let entries = self
            .indices
            .iter()
            .map(|index| {
                let status = match results.remove(&index.symbol) {
                    Some(Ok(raw)) => match Quote::from_source(&raw, basis) {
                        Ok(quote) => QuoteStatus::Available(quote),
                        Err(e) => QuoteStatus::unavailable(e.to_string()),
                    },
                    Some(Err(e)) => QuoteStatus::unavailable(e.to_string()),
                    None => QuoteStatus::unavailable("no result returned"),
                };
                IndexQuote {
                    index: index.clone(),
                    status,
                }
            })
            .collect();

        Snapshot::new(entries)
    }

    /// Start the refresh loop as a background task
    ///
    /// Returns the handle used to observe and stop the loop, and a receiver
    /// of per-cycle reports that sees every cycle from the first one.
    pub fn spawn(self) -> (RefresherHandle, broadcast::Receiver<CycleReport>) {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (report_tx, report_rx) = broadcast::channel(REPORT_CAPACITY);
        let state_rx = self.state_tx.subscribe();
        let reports = report_tx.clone();

        let task = tokio::spawn(async move {
            self.run(stop_rx, report_tx).await;
        });

        let handle = RefresherHandle {
            stop_tx,
            state_rx,
            reports,
            task,
        };
        (handle, report_rx)
    }

    /// The scheduling loop
    async fn run(
        mut self,
        mut stop_rx: watch::Receiver<bool>,
        reports: broadcast::Sender<CycleReport>,
    ) {
        let mut backoff = Backoff::new(self.config.interval, self.config.max_backoff);

        tracing::info!(
            indices = self.indices.len(),
            interval_secs = self.config.interval.as_secs_f64(),
            "Refresher started"
        );

        loop {
            let stopping = *stop_rx.borrow();
            if stopping {
                break;
            }

            let cycle_start = Instant::now();
            let report = self.run_cycle().await;
            let delay = if report.is_published() {
                backoff.on_success()
            } else {
                backoff.on_failure()
            };

            // No subscribers is fine
            let _ = reports.send(report);

            tokio::select! {
                _ = sleep_until(cycle_start + delay) => {}
                changed = stop_rx.changed() => {
                    if changed.is_err() {
                        tracing::debug!("Stop sender dropped, exiting refresher");
                        break;
                    }
                }
            }
        }

        self.set_state(RefreshState::Stopped);
        tracing::info!(cycles = self.cycles, "Refresher stopped");
    }
}

/// Loop state as seen through a receiver
///
/// The sender lives inside the loop task, so a closed channel whose last
/// state is not `Stopped` means the task ended some other way.
pub fn observed_state(state_rx: &watch::Receiver<RefreshState>) -> RefreshState {
    let state = *state_rx.borrow();
    if state_rx.has_changed().is_err() && state != RefreshState::Stopped {
        RefreshState::Crashed
    } else {
        state
    }
}

/// Handle to a running refresh loop
pub struct RefresherHandle {
    stop_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<RefreshState>,
    reports: broadcast::Sender<CycleReport>,
    task: JoinHandle<()>,
}

impl RefresherHandle {
    /// Current loop state
    pub fn state(&self) -> RefreshState {
        *self.state_rx.borrow()
    }

    /// A receiver that follows loop state changes
    pub fn state_receiver(&self) -> watch::Receiver<RefreshState> {
        self.state_rx.clone()
    }

    /// Current loop state, `Crashed` if the loop died
    pub fn observed_state(&self) -> RefreshState {
        observed_state(&self.state_rx)
    }

    /// Subscribe to reports of cycles that finish from now on
    pub fn subscribe(&self) -> broadcast::Receiver<CycleReport> {
        self.reports.subscribe()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the loop to stop and wait up to `grace` for it to exit
    ///
    /// An in-flight cycle is allowed to finish within the grace period;
    /// after that the task is aborted and the fetch abandoned.
    pub async fn stop(self, grace: Duration) -> StopOutcome {
        let _ = self.stop_tx.send(true);
        let mut task = self.task;

        match tokio::time::timeout(grace, &mut task).await {
            Ok(Ok(())) => StopOutcome::Completed,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Refresher task died before stop");
                StopOutcome::Crashed
            }
            Err(_) => {
                tracing::warn!(grace_secs = grace.as_secs_f64(), "Refresher did not stop in time, aborting");
                task.abort();
                let _ = task.await;
                StopOutcome::Abandoned
            }
        }
    }
}
