//! Broker configuration.

use serde::{Deserialize, Serialize};

use super::cost_model::{Commission, CostModel, Slippage};
use super::liquidity::LiquidityPolicy;
use super::trigger::GapPolicy;
use crate::config::ConfigError;

/// What happens when a fill needs more cash than the broker holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarginPolicy {
    /// The whole order goes to `Margin`.
    #[default]
    Reject,
    /// Fill the affordable part and cancel the rest.
    PartialFill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BrokerConfig {
    /// Starting cash.
    pub cash: f64,
    pub commission: Commission,
    pub slippage: Slippage,
    /// Contract multiplier.
    pub mult: f64,
    pub gap_policy: GapPolicy,
    pub liquidity: Option<LiquidityPolicy>,
    pub margin_policy: MarginPolicy,
    /// Reject exposure-increasing orders whose estimated cost exceeds cash
    /// already at submission.
    pub check_submit: bool,
    pub allow_short: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            cash: 10_000.0,
            commission: Commission::None,
            slippage: Slippage::None,
            mult: 1.0,
            gap_policy: GapPolicy::FillAtOpen,
            liquidity: None,
            margin_policy: MarginPolicy::Reject,
            check_submit: true,
            allow_short: true,
        }
    }
}

impl BrokerConfig {
    pub fn with_cash(cash: f64) -> Self {
        Self {
            cash,
            ..Self::default()
        }
    }

    pub fn cost_model(&self) -> CostModel {
        CostModel::new(self.commission, self.slippage, self.mult)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cash.is_finite() && self.cash > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "broker.cash must be positive, got {}",
                self.cash
            )));
        }
        self.cost_model().validate()?;
        if let Some(liquidity) = &self.liquidity {
            liquidity.validate()?;
        }
        Ok(())
    }
}
