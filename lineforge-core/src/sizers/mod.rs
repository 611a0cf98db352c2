//! Position Sizers — determine order quantity
//!
//! Sizers translate cash, portfolio value and the current price into a unit
//! quantity when a strategy buys or sells without an explicit size. They are
//! portfolio-aware but signal-agnostic.

pub mod fixed;
pub mod percent;

pub use fixed::FixedSizer;
pub use percent::{AllInSizer, PercentSizer};

use crate::domain::{FillSizing, Side};

/// Broker state a sizer sees when the strategy asks for a default size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingContext {
    pub cash: f64,
    pub value: f64,
    /// Current close of the feed being traded.
    pub price: f64,
    /// Signed position size on that feed.
    pub position: f64,
    pub side: Side,
    /// Contract multiplier.
    pub mult: f64,
}

/// Position sizing logic
///
/// # Responsibilities
/// - Convert broker state + side + price → order quantity
/// - Return 0.0 when nothing sensible can be traded
///
/// # Non-Responsibilities
/// - Sizers do NOT decide entry/exit (that's the strategy's job)
/// - Sizers do NOT choose order types
pub trait Sizer: Send + Sync {
    /// Unsigned quantity to trade. 0.0 means "do not trade".
    fn size(&self, ctx: &SizingContext) -> f64;

    /// Sizer name for logging
    fn name(&self) -> &str;

    /// Resize orders at their fill price instead of trusting `size`.
    fn fill_sizing(&self) -> Option<FillSizing> {
        None
    }
}

/// Drop fractional units when `whole_units` is set.
pub(crate) fn finish(qty: f64, whole_units: bool) -> f64 {
    if !qty.is_finite() || qty <= 0.0 {
        return 0.0;
    }
    if whole_units {
        qty.floor()
    } else {
        qty
    }
}

#[cfg(test)]
pub(crate) fn ctx(cash: f64, value: f64, price: f64) -> SizingContext {
    SizingContext {
        cash,
        value,
        price,
        position: 0.0,
        side: Side::Buy,
        mult: 1.0,
    }
}
