//! Quote types

use super::percent_change;
use crate::source::SymbolError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream identifier for one tracked index (e.g. "^GSPC")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new symbol
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A configured index: display name plus upstream symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedIndex {
    /// Name shown to clients (e.g. "S&P 500")
    pub name: String,
    /// Upstream symbol (e.g. "^GSPC")
    pub symbol: Symbol,
}

impl TrackedIndex {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: Symbol::new(symbol),
        }
    }
}

/// Reference price used for percent change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeBasis {
    /// Compare against the previous session close
    #[default]
    PreviousClose,
    /// Compare against today's open
    Open,
}

/// Raw prices returned by a quote source for one symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceQuote {
    pub current_price: Decimal,
    pub previous_close: Decimal,
    /// Latest session open, when the source reports it
    pub open: Option<Decimal>,
}

/// A fully derived quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub current_price: Decimal,
    pub previous_close: Decimal,
    pub percent_change: Decimal,
}

impl Quote {
    /// Build a quote from already known prices against the previous close
    pub fn new(current_price: Decimal, previous_close: Decimal) -> Result<Self, SymbolError> {
        let raw = SourceQuote {
            current_price,
            previous_close,
            open: None,
        };
        Self::from_source(&raw, ChangeBasis::PreviousClose)
    }

    /// Derive a quote from raw source prices
    pub fn from_source(raw: &SourceQuote, basis: ChangeBasis) -> Result<Self, SymbolError> {
        let reference = match basis {
            ChangeBasis::PreviousClose => raw.previous_close,
            ChangeBasis::Open => raw.open.ok_or(SymbolError::MissingField("open"))?,
        };

        Ok(Self {
            current_price: raw.current_price,
            previous_close: raw.previous_close,
            percent_change: percent_change(raw.current_price, reference)
                .ok_or(SymbolError::OutOfRange("percent_change"))?,
        })
    }
}

/// Quote for one index, or the reason it is unavailable this cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteStatus {
    Available(Quote),
    Unavailable { reason: String },
}

impl QuoteStatus {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, QuoteStatus::Available(_))
    }

    /// The quote, if available
    pub fn quote(&self) -> Option<&Quote> {
        match self {
            QuoteStatus::Available(q) => Some(q),
            QuoteStatus::Unavailable { .. } => None,
        }
    }
}
