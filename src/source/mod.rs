//! Quote source module
//!
//! The upstream collaborator the refresher pulls prices from. Sources may
//! fail per symbol or wholesale; latency is unbounded unless the caller
//! imposes a timeout.

mod types;
mod yahoo;

pub use types::{FetchResults, SourceError, SymbolError};
pub use yahoo::{YahooConfig, YahooSource, YAHOO_API_URL};

use crate::quote::Symbol;
use async_trait::async_trait;

/// Trait for quote source implementations
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Fetch the latest prices for every given symbol
    ///
    /// Returns per-symbol results, or an error when the upstream is
    /// unreachable as a whole.
    async fn fetch(&self, symbols: &[Symbol]) -> Result<FetchResults, SourceError>;
}
