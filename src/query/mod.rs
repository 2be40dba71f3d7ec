//! Query interface
//!
//! Read-only view of the cache for the HTTP layer. Maps the latest snapshot
//! to the wire format, or to an explicit "not yet available" answer before
//! the first successful refresh.

mod wire;

pub use wire::{WireQuote, WireQuotes, NOT_AVAILABLE};

use crate::cache::{QuoteCache, Snapshot};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Result of a market indices query
#[derive(Debug, Clone, PartialEq)]
pub enum MarketIndicesView {
    /// No refresh has succeeded yet
    NotYetAvailable,
    /// Latest published quotes
    Available {
        quotes: WireQuotes,
        /// Snapshot is older than the configured max age
        stale: bool,
        /// Snapshot capture time
        as_of: DateTime<Utc>,
    },
}

/// Answers quote queries from the cache without touching the network
#[derive(Debug, Clone)]
pub struct QueryService {
    cache: Arc<QuoteCache>,
    max_age: Duration,
}

impl QueryService {
    pub fn new(cache: Arc<QuoteCache>, max_age: Duration) -> Self {
        Self { cache, max_age }
    }

    /// Max snapshot age before it is flagged stale
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn cache(&self) -> &Arc<QuoteCache> {
        &self.cache
    }

    /// Latest snapshot rendered in wire format
    pub fn get_latest_snapshot_as_wire_format(&self) -> MarketIndicesView {
        self.view_at(Utc::now())
    }

    /// Wire view with staleness judged at `now`
    ///
    /// Quotes, capture time and staleness all come from one cache read.
    pub fn view_at(&self, now: DateTime<Utc>) -> MarketIndicesView {
        match self.cache.get_latest() {
            None => MarketIndicesView::NotYetAvailable,
            Some(snapshot) => MarketIndicesView::Available {
                quotes: to_wire(&snapshot),
                stale: snapshot.is_stale_at(self.max_age, now),
                as_of: snapshot.timestamp(),
            },
        }
    }

    /// Whether the held snapshot is missing or older than the max age
    pub fn is_stale(&self) -> bool {
        self.cache.is_stale(self.max_age)
    }
}

/// Render a snapshot keyed by display name
pub fn to_wire(snapshot: &Snapshot) -> WireQuotes {
    snapshot
        .entries()
        .iter()
        .map(|entry| (entry.index.name.clone(), WireQuote::from(&entry.status)))
        .collect()
}
