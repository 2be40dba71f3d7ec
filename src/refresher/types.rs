//! Refresher types

use crate::quote::{ChangeBasis, Symbol};
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Refresher configuration
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Time between the starts of consecutive successful cycles
    pub interval: Duration,
    /// Upper bound on a single QuoteSource call (None = unbounded)
    pub fetch_timeout: Option<Duration>,
    /// Longest wait after repeated whole-cycle failures
    pub max_backoff: Duration,
    /// Reference price for percent change
    pub change_basis: ChangeBasis,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(120),
            fetch_timeout: Some(Duration::from_secs(20)),
            max_backoff: Duration::from_secs(900),
            change_basis: ChangeBasis::PreviousClose,
        }
    }
}

impl RefreshConfig {
    /// Create a config with the given interval and defaults elsewhere
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Set the per-fetch timeout
    pub fn fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the maximum backoff delay
    pub fn max_backoff(mut self, d: Duration) -> Self {
        self.max_backoff = d;
        self
    }

    /// Set the percent change basis
    pub fn change_basis(mut self, basis: ChangeBasis) -> Self {
        self.change_basis = basis;
        self
    }
}

/// Refresher loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// Waiting for the next cycle
    Idle,
    /// Awaiting the QuoteSource
    Fetching,
    /// Building and publishing a snapshot
    Publishing,
    /// Last cycle failed; previous snapshot stays authoritative
    Failed,
    /// Loop has exited
    Stopped,
    /// Loop task ended without reaching `Stopped`
    Crashed,
}

impl RefreshState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshState::Idle => "idle",
            RefreshState::Fetching => "fetching",
            RefreshState::Publishing => "publishing",
            RefreshState::Failed => "failed",
            RefreshState::Stopped => "stopped",
            RefreshState::Crashed => "crashed",
        }
    }
}

/// Whole-cycle failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshError {
    /// QuoteSource did not answer within the fetch timeout
    #[error("Quote fetch timed out after {0:?}")]
    Timeout(Duration),
    /// QuoteSource failed wholesale
    #[error("Quote source failed: {0}")]
    Source(String),
}

/// What a single cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A new snapshot was published
    Published {
        /// Symbols with a fresh quote
        fresh: usize,
        /// Symbols degraded to unavailable
        unavailable: Vec<Symbol>,
    },
    /// Nothing was published
    Failed { error: RefreshError },
}

/// Structured result of one refresh cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Cycle sequence number, starting at 1
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub outcome: CycleOutcome,
}

impl CycleReport {
    pub fn is_published(&self) -> bool {
        matches!(self.outcome, CycleOutcome::Published { .. })
    }
}

/// How the loop ended after a stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Loop exited on its own within the grace period
    Completed,
    /// Loop was aborted after the grace period elapsed
    Abandoned,
    /// Loop task had already died from a panic
    Crashed,
}
