//! Cost model — slippage, commission and contract multiplier.
//!
//! Slippage is directional: buyers pay more (higher price), sellers receive less
//! (lower price). A slipped price never leaves the bar's high/low range.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::domain::{BarPrices, Side};

/// Commission scheme charged on every fill.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Commission {
    #[default]
    None,
    /// Fraction of notional, e.g. 0.001 = 10 bps.
    Percentage(f64),
    /// Fixed amount per unit traded.
    PerUnit(f64),
    /// Fixed amount per fill.
    PerOrder(f64),
}

/// Slippage applied to the raw fill price.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Slippage {
    #[default]
    None,
    /// Fraction of price.
    Percent(f64),
    /// Price points.
    Fixed(f64),
}

/// Cost model for execution friction (slippage + commission).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub commission: Commission,
    pub slippage: Slippage,
    /// Contract multiplier: notional = size × price × mult.
    pub mult: f64,
}

impl CostModel {
    pub fn new(commission: Commission, slippage: Slippage, mult: f64) -> Self {
        Self {
            commission,
            slippage,
            mult,
        }
    }

    pub fn frictionless() -> Self {
        Self::new(Commission::None, Slippage::None, 1.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = match self.commission {
            Commission::None => 0.0,
            Commission::Percentage(v) | Commission::PerUnit(v) | Commission::PerOrder(v) => v,
        };
        if !(rate.is_finite() && rate >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "commission must be finite and non-negative, got {rate}"
            )));
        }
        let slip = match self.slippage {
            Slippage::None => 0.0,
            Slippage::Percent(v) | Slippage::Fixed(v) => v,
        };
        if !(slip.is_finite() && slip >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "slippage must be finite and non-negative, got {slip}"
            )));
        }
        if !(self.mult.is_finite() && self.mult > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "mult must be positive, got {}",
                self.mult
            )));
        }
        Ok(())
    }

    /// Apply slippage to a raw fill price, clamped to the bar's range.
    pub fn apply_slippage(&self, raw_price: f64, side: Side, bar: &BarPrices) -> f64 {
        let slipped = match (self.slippage, side) {
            (Slippage::None, _) => return raw_price,
            (Slippage::Percent(p), Side::Buy) => raw_price * (1.0 + p),
            (Slippage::Percent(p), Side::Sell) => raw_price * (1.0 - p),
            (Slippage::Fixed(f), Side::Buy) => raw_price + f,
            (Slippage::Fixed(f), Side::Sell) => raw_price - f,
        };
        match side {
            Side::Buy if bar.high.is_finite() => slipped.min(bar.high.max(raw_price)),
            Side::Sell if bar.low.is_finite() => slipped.max(bar.low.min(raw_price)),
            _ => slipped,
        }
    }

    pub fn notional(&self, price: f64, qty: f64) -> f64 {
        qty.abs() * price * self.mult
    }

    /// Commission for one fill of `qty` units at `price`.
    pub fn compute_commission(&self, price: f64, qty: f64) -> f64 {
        if qty <= 0.0 {
            return 0.0;
        }
        match self.commission {
            Commission::None => 0.0,
            Commission::Percentage(p) => self.notional(price, qty) * p,
            Commission::PerUnit(u) => qty * u,
            Commission::PerOrder(fee) => fee,
        }
    }

    /// Commission excluding the per-fill fee.
    pub fn variable_commission(&self, price: f64, qty: f64) -> f64 {
        self.compute_commission(price, qty) - if qty > 0.0 { self.per_fill_fee() } else { 0.0 }
    }

    /// Cash needed per additional unit of exposure, excluding per-fill fees.
    pub fn unit_cost(&self, price: f64) -> f64 {
        let notional = price * self.mult;
        match self.commission {
            Commission::Percentage(p) => notional * (1.0 + p),
            Commission::PerUnit(u) => notional + u,
            Commission::None | Commission::PerOrder(_) => notional,
        }
    }

    /// Fixed fee charged once per fill.
    pub fn per_fill_fee(&self) -> f64 {
        match self.commission {
            Commission::PerOrder(fee) => fee,
            _ => 0.0,
        }
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::frictionless()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar() -> BarPrices {
        BarPrices {
            open: 100.0,
            high: 101.0,
            low: 99.0,
            close: 100.5,
            volume: 1000.0,
        }
    }

    #[test]
    fn frictionless_returns_raw_price() {
        let cost = CostModel::frictionless();
        assert_eq!(cost.apply_slippage(100.0, Side::Buy, &bar()), 100.0);
        assert_eq!(cost.compute_commission(100.0, 50.0), 0.0);
    }

    #[test]
    fn buy_slippage_increases_price() {
        let cost = CostModel::new(Commission::None, Slippage::Percent(0.001), 1.0);
        let price = cost.apply_slippage(100.0, Side::Buy, &bar());
        assert!((price - 100.10).abs() < 1e-10);
    }

    #[test]
    fn sell_slippage_decreases_price() {
        let cost = CostModel::new(Commission::None, Slippage::Fixed(0.25), 1.0);
        let price = cost.apply_slippage(100.0, Side::Sell, &bar());
        assert!((price - 99.75).abs() < 1e-10);
    }

    #[test]
    fn slippage_clamped_to_bar_range() {
        let cost = CostModel::new(Commission::None, Slippage::Fixed(5.0), 1.0);
        assert_eq!(cost.apply_slippage(100.0, Side::Buy, &bar()), 101.0);
        assert_eq!(cost.apply_slippage(100.0, Side::Sell, &bar()), 99.0);
    }

    #[test]
    fn commission_schemes() {
        let pct = CostModel::new(Commission::Percentage(0.001), Slippage::None, 1.0);
        assert!((pct.compute_commission(100.0, 1000.0) - 100.0).abs() < 1e-10);
        let unit = CostModel::new(Commission::PerUnit(0.01), Slippage::None, 1.0);
        assert!((unit.compute_commission(100.0, 1000.0) - 10.0).abs() < 1e-10);
        let fixed = CostModel::new(Commission::PerOrder(5.0), Slippage::None, 1.0);
        assert_eq!(fixed.compute_commission(100.0, 3.0), 5.0);
        assert_eq!(fixed.per_fill_fee(), 5.0);
    }

    #[test]
    fn multiplier_scales_notional_and_percentage_commission() {
        let cost = CostModel::new(Commission::Percentage(0.01), Slippage::None, 10.0);
        assert_eq!(cost.notional(50.0, 2.0), 1000.0);
        assert!((cost.compute_commission(50.0, 2.0) - 10.0).abs() < 1e-10);
        assert!((cost.unit_cost(50.0) - 505.0).abs() < 1e-10);
    }

    #[test]
    fn negative_rates_rejected() {
        assert!(CostModel::new(Commission::PerUnit(-1.0), Slippage::None, 1.0)
            .validate()
            .is_err());
        assert!(CostModel::new(Commission::None, Slippage::Percent(f64::NAN), 1.0)
            .validate()
            .is_err());
        assert!(CostModel::new(Commission::None, Slippage::None, 0.0)
            .validate()
            .is_err());
    }

    #[test]
    fn commission_deserializes_tagged() {
        #[derive(Deserialize)]
        struct Holder {
            commission: Commission,
        }
        let h: Holder = toml::from_str("commission = { kind = \"percentage\", value = 0.002 }").unwrap();
        assert_eq!(h.commission, Commission::Percentage(0.002));
    }
}
