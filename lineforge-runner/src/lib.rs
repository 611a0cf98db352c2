//! Lineforge Runner — configured runs, parameter sweeps and metrics.
//!
//! This crate builds on `lineforge-core` to provide:
//! - TOML run configuration with a content-addressed run id
//! - A single-run entry point producing a serializable report
//! - Parallel parameter sweeps over independent engines
//! - Performance metrics over the engine's value curve and trades

pub mod config;
pub mod metrics;
pub mod result;
pub mod runner;
pub mod sweep;

pub use config::{ConfigError, DataConfig, ParamGrid, RunConfig, RunId, SizerConfig};
pub use metrics::PerformanceMetrics;
pub use result::RunReport;
pub use runner::{run, run_toml};
pub use sweep::{ParamSweep, SweepResults};
