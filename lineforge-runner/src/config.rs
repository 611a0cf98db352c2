//! Serializable run configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lineforge_core::domain::Bar;
use lineforge_core::feed::synthetic::{bars_from_prices, random_walk};
use lineforge_core::sizers::{AllInSizer, FixedSizer, PercentSizer};
use lineforge_core::strategy::SmaCrossParams;
use lineforge_core::{Cerebro, CerebroConfig};

/// Unique identifier for a run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse run config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize run config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] lineforge_core::ConfigError),

    #[error("invalid run config: {0}")]
    Invalid(String),
}

/// Everything needed to reproduce one backtest.
///
/// Two configs with the same [`run_id`](RunConfig::run_id) produce the same
/// [`RunResult`](lineforge_core::RunResult).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub data: DataConfig,
    #[serde(default)]
    pub engine: CerebroConfig,
    #[serde(default)]
    pub strategy: SmaCrossParams,
    #[serde(default)]
    pub sizer: SizerConfig,
    /// Parameter grid swept by [`crate::sweep`]. Ignored by a single run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweep: Option<ParamGrid>,
}

fn default_name() -> String {
    "run".to_string()
}

impl RunConfig {
    pub fn new(data: DataConfig) -> Self {
        Self {
            name: default_name(),
            data,
            engine: CerebroConfig::default(),
            strategy: SmaCrossParams::default(),
            sizer: SizerConfig::default(),
            sweep: None,
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("name must not be empty".into()));
        }
        self.data.validate()?;
        self.engine.validate()?;
        self.strategy.validate()?;
        self.sizer.validate()?;
        if let Some(grid) = &self.sweep {
            grid.validate()?;
        }
        Ok(())
    }

    /// BLAKE3 hash of the canonical JSON form.
    ///
    /// Struct fields serialize in declaration order, so equal configs always
    /// hash equally.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

/// Where the bars of the single feed come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataConfig {
    /// Seeded geometric random walk.
    RandomWalk {
        bars: usize,
        #[serde(default = "default_start_price")]
        start_price: f64,
        #[serde(default = "default_volatility")]
        volatility: f64,
        #[serde(default)]
        seed: u64,
    },
    /// Flat bars (open = high = low = close) from inline prices.
    Prices { prices: Vec<f64> },
}

fn default_start_price() -> f64 {
    100.0
}

fn default_volatility() -> f64 {
    0.02
}

impl DataConfig {
    pub fn random_walk(bars: usize, seed: u64) -> Self {
        Self::RandomWalk {
            bars,
            start_price: default_start_price(),
            volatility: default_volatility(),
            seed,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::RandomWalk {
                bars,
                start_price,
                volatility,
                ..
            } => {
                if *bars == 0 {
                    return Err(ConfigError::Invalid("random walk needs at least one bar".into()));
                }
                if !(start_price.is_finite() && *start_price > 0.0) {
                    return Err(ConfigError::Invalid(format!(
                        "start_price must be positive, got {start_price}"
                    )));
                }
                if !(volatility.is_finite() && (0.0..1.0).contains(volatility)) {
                    return Err(ConfigError::Invalid(format!(
                        "volatility must lie in [0, 1), got {volatility}"
                    )));
                }
            }
            Self::Prices { prices } => {
                if prices.is_empty() {
                    return Err(ConfigError::Invalid("prices must not be empty".into()));
                }
                if let Some(bad) = prices.iter().find(|p| !(p.is_finite() && **p > 0.0)) {
                    return Err(ConfigError::Invalid(format!(
                        "prices must be positive and finite, got {bad}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn bars(&self) -> Vec<Bar> {
        match self {
            Self::RandomWalk {
                bars,
                start_price,
                volatility,
                seed,
            } => random_walk(*bars, *start_price, *volatility, *seed),
            Self::Prices { prices } => bars_from_prices(prices),
        }
    }
}

/// Default order size used when the strategy buys or sells without one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SizerConfig {
    Units { quantity: f64 },
    Notional { amount: f64 },
    Percent {
        percent: f64,
        #[serde(default)]
        whole_units: bool,
    },
    AllIn {
        #[serde(default)]
        whole_units: bool,
    },
}

impl Default for SizerConfig {
    fn default() -> Self {
        Self::AllIn { whole_units: false }
    }
}

impl SizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Units { quantity } => FixedSizer::units(quantity).map(drop)?,
            Self::Notional { amount } => FixedSizer::notional(amount).map(drop)?,
            Self::Percent {
                percent,
                whole_units,
            } => PercentSizer::new(percent, whole_units).map(drop)?,
            Self::AllIn { .. } => {}
        }
        Ok(())
    }

    /// Build the sizer and attach it to `cerebro`.
    pub fn install(&self, cerebro: &mut Cerebro) -> Result<(), ConfigError> {
        match *self {
            Self::Units { quantity } => cerebro.set_sizer(FixedSizer::units(quantity)?),
            Self::Notional { amount } => cerebro.set_sizer(FixedSizer::notional(amount)?),
            Self::Percent {
                percent,
                whole_units,
            } => cerebro.set_sizer(PercentSizer::new(percent, whole_units)?),
            Self::AllIn { whole_units } => cerebro.set_sizer(AllInSizer::new(whole_units)),
        }
        Ok(())
    }
}

/// SMA-crossover periods to sweep. Pairs with `fast >= slow` are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamGrid {
    pub fast: Vec<usize>,
    pub slow: Vec<usize>,
}

impl ParamGrid {
    pub fn new(fast: Vec<usize>, slow: Vec<usize>) -> Self {
        Self { fast, slow }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fast.is_empty() || self.slow.is_empty() {
            return Err(ConfigError::Invalid("sweep grid axes must not be empty".into()));
        }
        if self.fast.contains(&0) || self.slow.contains(&0) {
            return Err(ConfigError::Invalid("sweep periods must be >= 1".into()));
        }
        if self.size() == 0 {
            return Err(ConfigError::Invalid(
                "sweep grid has no pair with fast < slow".into(),
            ));
        }
        Ok(())
    }

    /// Valid `(fast, slow)` pairs, fast-major.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.fast.iter().flat_map(move |&fast| {
            self.slow
                .iter()
                .filter(move |&&slow| fast < slow)
                .map(move |&slow| (fast, slow))
        })
    }

    pub fn size(&self) -> usize {
        self.pairs().count()
    }

    /// One single-run config per pair, in [`pairs`](Self::pairs) order.
    pub fn generate_configs(&self, base: &RunConfig) -> Vec<RunConfig> {
        self.pairs()
            .map(|(fast, slow)| {
                let mut config = base.clone();
                config.strategy.fast = fast;
                config.strategy.slow = slow;
                config.sweep = None;
                config
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> RunConfig {
        RunConfig::new(DataConfig::random_walk(200, 1))
    }

    #[test]
    fn test_run_id_deterministic() {
        let config = base();
        let id1 = config.run_id().unwrap();
        let id2 = config.clone().run_id().unwrap();
        assert_eq!(id1, id2, "RunId should be deterministic");
        assert_eq!(id1.len(), 64);
    }

    #[test]
    fn test_run_id_changes_with_params() {
        let config1 = base();
        let mut config2 = config1.clone();
        config2.strategy.fast = 5;
        assert_ne!(config1.run_id().unwrap(), config2.run_id().unwrap());

        let mut config3 = config1.clone();
        config3.engine.broker.cash = 20_000.0;
        assert_ne!(config1.run_id().unwrap(), config3.run_id().unwrap());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = RunConfig::from_toml_str(
            r#"
            name = "spy-like"

            [data]
            kind = "random_walk"
            bars = 300
            seed = 9

            [engine]
            run_mode = "stepped"

            [engine.broker]
            cash = 50000.0
            commission = { kind = "percentage", value = 0.001 }

            [strategy]
            fast = 5
            slow = 20

            [sizer]
            kind = "percent"
            percent = 50.0

            [sweep]
            fast = [5, 10]
            slow = [20, 40]
            "#,
        )
        .unwrap();
        assert_eq!(config.name, "spy-like");
        assert_eq!(
            config.data,
            DataConfig::RandomWalk {
                bars: 300,
                start_price: 100.0,
                volatility: 0.02,
                seed: 9
            }
        );
        assert_eq!(config.engine.broker.cash, 50_000.0);
        assert_eq!(config.strategy.fast, 5);
        assert!(config.strategy.long_only);
        assert_eq!(
            config.sizer,
            SizerConfig::Percent {
                percent: 50.0,
                whole_units: false
            }
        );
        assert_eq!(config.sweep.as_ref().map(ParamGrid::size), Some(4));

        let json = serde_json::to_string(&config).unwrap();
        let back: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = RunConfig::from_toml_str(
            "[data]\nkind = \"prices\"\nprices = [1.0]\n[strategy]\nfast = 2\nslow = 3\nperiod = 4\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = base();
        config.strategy.fast = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Core(_))));

        let config = RunConfig::new(DataConfig::Prices { prices: vec![] });
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = RunConfig::new(DataConfig::Prices {
            prices: vec![1.0, f64::NAN],
        });
        assert!(config.validate().is_err());

        let mut config = base();
        config.sizer = SizerConfig::Percent {
            percent: 150.0,
            whole_units: false,
        };
        assert!(matches!(config.validate(), Err(ConfigError::Core(_))));
    }

    #[test]
    fn test_grid_skips_inverted_pairs() {
        let grid = ParamGrid::new(vec![5, 20, 50], vec![20, 50]);
        let pairs: Vec<_> = grid.pairs().collect();
        assert_eq!(pairs, vec![(5, 20), (5, 50), (20, 50)]);

        let configs = grid.generate_configs(&base());
        assert_eq!(configs.len(), 3);
        assert!(configs.iter().all(|c| c.sweep.is_none()));
        assert_eq!((configs[2].strategy.fast, configs[2].strategy.slow), (20, 50));
    }

    #[test]
    fn test_empty_grid_rejected() {
        assert!(ParamGrid::new(vec![50], vec![10]).validate().is_err());
        assert!(ParamGrid::new(vec![], vec![10]).validate().is_err());
        assert!(ParamGrid::new(vec![0], vec![10]).validate().is_err());
    }
}
