//! Quote module
//!
//! Symbols, per-index quotes and the percent-change calculation

mod types;

pub use types::{ChangeBasis, Quote, QuoteStatus, SourceQuote, Symbol, TrackedIndex};

use rust_decimal::Decimal;

/// Percent change of `current` relative to `reference`
///
/// Defined as zero when the reference price is zero. Returns `None` when the
/// result does not fit in a `Decimal`.
pub fn percent_change(current: Decimal, reference: Decimal) -> Option<Decimal> {
    if reference.is_zero() {
        return Some(Decimal::ZERO);
    }
    current
        .checked_sub(reference)?
        .checked_div(reference)?
        .checked_mul(Decimal::ONE_HUNDRED)
}
