//! Engine configuration loaded from TOML.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::broker::BrokerConfig;
use crate::engine::RunModeKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything `Cerebro` needs besides feeds, sizer and strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CerebroConfig {
    pub run_mode: RunModeKind,
    pub broker: BrokerConfig,
}

impl CerebroConfig {
    pub fn new(run_mode: RunModeKind, broker: BrokerConfig) -> Self {
        Self { run_mode, broker }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.broker.validate()
    }
}
