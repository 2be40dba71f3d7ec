//! Quote cache module
//!
//! Holds the most recently published snapshot. The refresher is the only
//! writer; any number of readers may call `get_latest` concurrently and
//! never wait on network I/O.

mod snapshot;

pub use snapshot::{IndexQuote, Snapshot};

use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// The published snapshot and when it was swapped in
#[derive(Debug, Clone)]
struct Published {
    snapshot: Arc<Snapshot>,
    published_at: DateTime<Utc>,
}

/// In-memory cache of the latest quote snapshot
#[derive(Debug, Default)]
pub struct QuoteCache {
    current: RwLock<Option<Published>>,
}

impl QuoteCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest published snapshot, or `None` before the first publish
    pub fn get_latest(&self) -> Option<Arc<Snapshot>> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        current.as_ref().map(|p| Arc::clone(&p.snapshot))
    }

    /// Replace the held snapshot as a whole
    pub fn publish(&self, snapshot: Snapshot) {
        let published = Published {
            snapshot: Arc::new(snapshot),
            published_at: Utc::now(),
        };
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(published);
    }

    /// When the held snapshot was published
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        current.as_ref().map(|p| p.published_at)
    }

    /// True if nothing is published or the snapshot is older than `max_age`
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.is_stale_at(max_age, Utc::now())
    }

    /// Staleness relative to an explicit clock reading
    pub fn is_stale_at(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        match self.get_latest() {
            None => true,
            Some(snapshot) => snapshot.is_stale_at(max_age, now),
        }
    }
}
