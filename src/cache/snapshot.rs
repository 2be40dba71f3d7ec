//! Immutable point-in-time quote snapshot

use crate::quote::{QuoteStatus, Symbol, TrackedIndex};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Quote status for one tracked index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuote {
    pub index: TrackedIndex,
    pub status: QuoteStatus,
}

/// All tracked indices at one capture time
///
/// Built once per refresh cycle and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    captured_at: DateTime<Utc>,
    entries: Vec<IndexQuote>,
}

impl Snapshot {
    /// Create a snapshot captured now
    pub fn new(entries: Vec<IndexQuote>) -> Self {
        Self::captured_at(Utc::now(), entries)
    }

    /// Create a snapshot with an explicit capture time
    pub fn captured_at(captured_at: DateTime<Utc>, entries: Vec<IndexQuote>) -> Self {
        Self {
            captured_at,
            entries,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Time since capture, zero if `now` is before the capture time
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.captured_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Whether the snapshot is older than `max_age` at `now`
    pub fn is_stale_at(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        self.age_at(now) > max_age
    }

    /// Entries in configured order
    pub fn entries(&self) -> &[IndexQuote] {
        &self.entries
    }

    /// Look up the status of a symbol
    pub fn get(&self, symbol: &Symbol) -> Option<&QuoteStatus> {
        self.entries
            .iter()
            .find(|e| &e.index.symbol == symbol)
            .map(|e| &e.status)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of indices with a fresh quote
    pub fn available_count(&self) -> usize {
        self.entries.iter().filter(|e| e.status.is_available()).count()
    }

    /// Symbols marked unavailable in this snapshot
    pub fn unavailable_symbols(&self) -> Vec<Symbol> {
        self.entries
            .iter()
            .filter(|e| !e.status.is_available())
            .map(|e| e.index.symbol.clone())
            .collect()
    }
}
