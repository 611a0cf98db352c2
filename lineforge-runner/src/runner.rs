//! Single-run entry point: config in, report out.

use anyhow::{Context, Result};
use log::{debug, info};

use lineforge_core::strategy::SmaCross;
use lineforge_core::Cerebro;

use crate::config::RunConfig;
use crate::metrics::PerformanceMetrics;
use crate::result::{RunReport, SCHEMA_VERSION};

/// Validate `config`, build a fresh engine and run it to completion.
///
/// Each call owns its feeds, graph and broker, so calls may run on any thread.
pub fn run(config: &RunConfig) -> Result<RunReport> {
    config
        .validate()
        .with_context(|| format!("invalid config '{}'", config.name))?;
    let run_id = config.run_id()?;
    debug!("run {} ({}) starting", config.name, run_id);

    let mut cerebro = Cerebro::new(config.engine.clone())?;
    cerebro.add_data(config.name.clone(), config.data.bars())?;
    config.sizer.install(&mut cerebro)?;

    let mut strategy = SmaCross::new(config.strategy)?;
    let result = cerebro
        .run(&mut strategy)
        .with_context(|| format!("run '{}' aborted", config.name))?;

    let initial = config.engine.broker.cash;
    let metrics = PerformanceMetrics::compute(&result.value_curve, &result.trades, initial);
    info!(
        "run {} sma({}, {}): final value {:.2}, {} trades",
        config.name, config.strategy.fast, config.strategy.slow, result.final_value, metrics.trade_count
    );

    Ok(RunReport {
        schema_version: SCHEMA_VERSION,
        run_id,
        config: config.clone(),
        metrics,
        result,
    })
}

/// Parse a TOML run config and run it.
pub fn run_toml(toml: &str) -> Result<RunReport> {
    let config = RunConfig::from_toml_str(toml).context("failed to load run config")?;
    run(&config)
}
