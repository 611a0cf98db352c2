//! Fixed Position Sizer
//!
//! Simplest sizer: trade a fixed quantity or fixed notional amount.

use crate::config::ConfigError;
use crate::sizers::{finish, Sizer, SizingContext};

/// Fixed position sizer
///
/// Two modes:
/// 1. **Fixed Units**: Always trade N units (e.g., 100 shares per order)
/// 2. **Fixed Notional**: Always trade $X worth (e.g., $10,000 per order)
#[derive(Debug, Clone, PartialEq)]
pub enum FixedSizer {
    /// Fixed number of units per order
    Units { quantity: f64 },

    /// Fixed cash amount per order
    Notional { amount: f64 },
}

impl FixedSizer {
    /// Create fixed units sizer
    pub fn units(quantity: f64) -> Result<Self, ConfigError> {
        if !(quantity.is_finite() && quantity > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fixed sizer quantity must be > 0, got {quantity}"
            )));
        }
        Ok(Self::Units { quantity })
    }

    /// Create fixed notional sizer
    pub fn notional(amount: f64) -> Result<Self, ConfigError> {
        if !(amount.is_finite() && amount > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fixed sizer amount must be > 0, got {amount}"
            )));
        }
        Ok(Self::Notional { amount })
    }
}

impl Default for FixedSizer {
    /// One unit per order.
    fn default() -> Self {
        Self::Units { quantity: 1.0 }
    }
}

impl Sizer for FixedSizer {
    fn size(&self, ctx: &SizingContext) -> f64 {
        match self {
            Self::Units { quantity } => *quantity,
            Self::Notional { amount } => {
                let unit = ctx.price * ctx.mult;
                if !(unit.is_finite() && unit > 0.0) {
                    return 0.0;
                }
                finish(amount / unit, false)
            }
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Units { .. } => "FixedUnits",
            Self::Notional { .. } => "FixedNotional",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizers::ctx;

    #[test]
    fn test_fixed_units() {
        let sizer = FixedSizer::units(100.0).unwrap();
        assert_eq!(sizer.size(&ctx(10_000.0, 10_000.0, 100.0)), 100.0);
    }

    #[test]
    fn test_fixed_notional_scales_with_price() {
        let sizer = FixedSizer::notional(10_000.0).unwrap();
        assert_eq!(sizer.size(&ctx(50_000.0, 50_000.0, 50.0)), 200.0);
        assert_eq!(sizer.size(&ctx(50_000.0, 50_000.0, 200.0)), 50.0);
    }

    #[test]
    fn test_nan_price_returns_zero() {
        let sizer = FixedSizer::notional(10_000.0).unwrap();
        assert_eq!(sizer.size(&ctx(50_000.0, 50_000.0, f64::NAN)), 0.0);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(FixedSizer::units(0.0).is_err());
        assert!(FixedSizer::notional(-1.0).is_err());
    }
}
