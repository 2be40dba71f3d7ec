//! Quote source types

use crate::quote::{SourceQuote, Symbol};
use std::collections::HashMap;
use thiserror::Error;

/// Per-symbol results of one fetch
pub type FetchResults = HashMap<Symbol, Result<SourceQuote, SymbolError>>;

/// Failure affecting a single symbol
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SymbolError {
    /// Upstream returned no data for the symbol
    #[error("No data: {0}")]
    NoData(String),
    /// A required price field was absent
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    /// Upstream answered with a non-success status
    #[error("HTTP status {0}")]
    Status(u16),
    /// The request could not be completed
    #[error("Request failed: {0}")]
    Request(String),
    /// The response body could not be decoded
    #[error("Invalid response: {0}")]
    Parse(String),
    /// Prices too large to derive a quote from
    #[error("Value out of range: {0}")]
    OutOfRange(&'static str),
}

impl SymbolError {
    /// Whether the failure says something about the upstream rather than
    /// about this symbol's data
    pub fn is_transport(&self) -> bool {
        match self {
            SymbolError::Request(_) => true,
            SymbolError::Status(code) => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

/// Failure affecting the whole fetch
#[derive(Debug, Error)]
pub enum SourceError {
    /// Every symbol failed at the transport level
    #[error("Upstream unavailable ({failed} symbols failed): {last}")]
    Upstream { failed: usize, last: SymbolError },
    /// The HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}
