//! Persistable outcome of one configured run.

use serde::{Deserialize, Serialize};

use lineforge_core::strategy::SmaCrossParams;
use lineforge_core::RunResult;

use crate::config::{RunConfig, RunId};
use crate::metrics::PerformanceMetrics;

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: RunConfig,
    pub metrics: PerformanceMetrics,
    pub result: RunResult,
}

impl RunReport {
    pub fn params(&self) -> SmaCrossParams {
        self.config.strategy
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn initial_capital(&self) -> f64 {
        self.config.engine.broker.cash
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        let p = self.params();
        format!(
            "{} sma({}, {}): return {:+.2}%, max dd {:.2}%, sharpe {:.2}, {} trades, final value {:.2}",
            self.name(),
            p.fast,
            p.slow,
            self.metrics.total_return * 100.0,
            self.metrics.max_drawdown * 100.0,
            self.metrics.sharpe,
            self.metrics.trade_count,
            self.result.final_value,
        )
    }
}
