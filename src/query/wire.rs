//! Wire format for index quotes

use crate::quote::QuoteStatus;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Marker sent in place of prices for unavailable indices
pub const NOT_AVAILABLE: &str = "N/A";

/// Decimal places kept on the wire
const WIRE_DP: u32 = 2;

/// Quotes keyed by index display name
pub type WireQuotes = BTreeMap<String, WireQuote>;

/// One index as sent to clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireQuote {
    Quoted {
        current_price: Decimal,
        percent_change: Decimal,
        previous_close: Decimal,
    },
    Unavailable,
}

impl From<&QuoteStatus> for WireQuote {
    fn from(status: &QuoteStatus) -> Self {
        match status {
            QuoteStatus::Available(q) => WireQuote::Quoted {
                current_price: q.current_price.round_dp(WIRE_DP),
                percent_change: q.percent_change.round_dp(WIRE_DP),
                previous_close: q.previous_close.round_dp(WIRE_DP),
            },
            QuoteStatus::Unavailable { .. } => WireQuote::Unavailable,
        }
    }
}

impl Serialize for WireQuote {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WireQuote::Quoted {
                current_price,
                percent_change,
                previous_close,
            } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("current_price", &as_number(current_price))?;
                map.serialize_entry("percent_change", &as_number(percent_change))?;
                map.serialize_entry("previous_close", &as_number(previous_close))?;
                map.end()
            }
            WireQuote::Unavailable => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("current_price", NOT_AVAILABLE)?;
                map.serialize_entry("percent_change", NOT_AVAILABLE)?;
                map.end()
            }
        }
    }
}

/// JSON number for a decimal; NaN never occurs for finite decimals
fn as_number(value: &Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
