//! Liquidity constraints — participation limits and remainder policies.
//!
//! Optional feature: when enabled, limits the fill quantity to a fraction
//! of the bar's volume. The unfilled remainder is either carried to the next
//! bar or cancelled.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Policy for handling unfilled remainder when the liquidity limit is hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Leave the remainder accepted for the next eligible bar.
    Carry,
    /// Cancel the unfilled remainder immediately.
    Cancel,
}

/// Liquidity constraint configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LiquidityPolicy {
    /// Maximum participation rate as a fraction of bar volume (0.0 to 1.0].
    /// Example: 0.10 means fill at most 10% of the bar's volume.
    pub max_participation: f64,
    /// What to do with the unfilled remainder.
    pub remainder: RemainderPolicy,
}

impl LiquidityPolicy {
    pub fn new(max_participation: f64, remainder: RemainderPolicy) -> Result<Self, ConfigError> {
        let policy = Self {
            max_participation,
            remainder,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_participation > 0.0 && self.max_participation <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "liquidity.max_participation must be in (0, 1], got {}",
                self.max_participation
            )));
        }
        Ok(())
    }

    /// Maximum fillable quantity given bar volume. NaN or negative volume is zero.
    pub fn max_fill_qty(&self, bar_volume: f64) -> f64 {
        if bar_volume.is_finite() && bar_volume > 0.0 {
            bar_volume * self.max_participation
        } else {
            0.0
        }
    }

    /// Apply liquidity constraint to a desired fill quantity.
    ///
    /// Returns `(fill_qty, remainder_qty)`. If no constraint binds,
    /// `remainder_qty` is zero.
    pub fn constrain(&self, desired_qty: f64, bar_volume: f64) -> (f64, f64) {
        let max_qty = self.max_fill_qty(bar_volume);
        if desired_qty <= max_qty {
            (desired_qty, 0.0)
        } else {
            (max_qty, desired_qty - max_qty)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(rate: f64, remainder: RemainderPolicy) -> LiquidityPolicy {
        LiquidityPolicy::new(rate, remainder).unwrap()
    }

    #[test]
    fn no_constraint_binds() {
        let (fill, remainder) = policy(0.10, RemainderPolicy::Carry).constrain(100.0, 10_000.0);
        assert_eq!(fill, 100.0); // 100 <= 1000 (10% of 10k)
        assert_eq!(remainder, 0.0);
    }

    #[test]
    fn constraint_limits_fill() {
        let (fill, remainder) = policy(0.10, RemainderPolicy::Carry).constrain(2000.0, 10_000.0);
        assert_eq!(fill, 1000.0);
        assert_eq!(remainder, 1000.0);
    }

    #[test]
    fn exact_limit_fills_completely() {
        let (fill, remainder) = policy(0.10, RemainderPolicy::Cancel).constrain(1000.0, 10_000.0);
        assert_eq!(fill, 1000.0);
        assert_eq!(remainder, 0.0);
    }

    #[test]
    fn zero_or_nan_volume_fills_nothing() {
        let p = policy(0.10, RemainderPolicy::Carry);
        assert_eq!(p.constrain(100.0, 0.0), (0.0, 100.0));
        assert_eq!(p.constrain(100.0, f64::NAN), (0.0, 100.0));
    }

    #[test]
    fn participation_out_of_range_rejected() {
        assert!(LiquidityPolicy::new(0.0, RemainderPolicy::Carry).is_err());
        assert!(LiquidityPolicy::new(1.5, RemainderPolicy::Carry).is_err());
        assert!(LiquidityPolicy::new(f64::NAN, RemainderPolicy::Carry).is_err());
    }
}
