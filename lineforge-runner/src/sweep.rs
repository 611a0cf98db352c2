//! Parameter sweep over SMA-crossover periods.
//!
//! Every grid point is an independent engine instance. With parallelism
//! enabled the points run on the rayon pool; results always come back in
//! grid order.

use std::collections::HashMap;

use anyhow::{Context, Result};
use log::info;
use rayon::prelude::*;

use crate::config::{ParamGrid, RunConfig};
use crate::result::RunReport;
use crate::runner;

/// Parameter sweep executor.
#[derive(Debug, Clone, Copy)]
pub struct ParamSweep {
    parallel: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every `(fast, slow)` pair of `grid` on top of `base`.
    pub fn sweep(&self, grid: &ParamGrid, base: &RunConfig) -> Result<SweepResults> {
        grid.validate().context("invalid sweep grid")?;
        let configs = grid.generate_configs(base);
        info!(
            "sweeping {} configs of '{}' ({})",
            configs.len(),
            base.name,
            if self.parallel { "parallel" } else { "sequential" }
        );

        let reports = if self.parallel {
            configs.par_iter().map(runner::run).collect::<Result<Vec<_>>>()?
        } else {
            configs.iter().map(runner::run).collect::<Result<Vec<_>>>()?
        };
        Ok(SweepResults::new(reports))
    }

    /// Sweep the grid embedded in `base.sweep`.
    pub fn sweep_config(&self, base: &RunConfig) -> Result<SweepResults> {
        let grid = base
            .sweep
            .as_ref()
            .with_context(|| format!("config '{}' has no [sweep] grid", base.name))?;
        self.sweep(grid, base)
    }
}

/// Results of a sweep, in grid order.
#[derive(Debug, Clone)]
pub struct SweepResults {
    reports: Vec<RunReport>,
    by_run_id: HashMap<String, usize>,
}

impl SweepResults {
    fn new(reports: Vec<RunReport>) -> Self {
        let by_run_id = reports
            .iter()
            .enumerate()
            .map(|(i, r)| (r.run_id.clone(), i))
            .collect();
        Self { reports, by_run_id }
    }

    pub fn all(&self) -> &[RunReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn get(&self, run_id: &str) -> Option<&RunReport> {
        self.by_run_id.get(run_id).map(|&i| &self.reports[i])
    }

    /// Report with the largest `key`; NaN keys never win. Ties keep the
    /// earliest grid point.
    pub fn best_by<F>(&self, key: F) -> Option<&RunReport>
    where
        F: Fn(&RunReport) -> f64,
    {
        self.reports
            .iter()
            .filter(|r| !key(r).is_nan())
            .fold(None, |best: Option<&RunReport>, r| match best {
                Some(b) if key(b) >= key(r) => Some(b),
                _ => Some(r),
            })
    }

    /// Reports sorted by descending `key`, grid order among ties.
    pub fn ranked_by<F>(&self, key: F) -> Vec<&RunReport>
    where
        F: Fn(&RunReport) -> f64,
    {
        let mut ranked: Vec<&RunReport> = self.reports.iter().collect();
        ranked.sort_by(|a, b| key(b).total_cmp(&key(a)));
        ranked
    }

    pub fn into_reports(self) -> Vec<RunReport> {
        self.reports
    }
}
