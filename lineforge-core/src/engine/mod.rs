//! Backtesting engine — indicator graph, run modes and the bar-loop driver.
//!
//! Each bar runs the fixed sequence:
//!
//! 1. Advance: feeds and indicator lines grow to cover the bar
//! 2. Deliver: queued order/trade notifications reach the strategy
//! 3. Callback: `prenext`, `nextstart` or `next`
//! 4. Resolve: the broker matches orders created on earlier bars
//! 5. Mark: value and cash are recorded

pub mod cerebro;
pub mod graph;
pub mod run_mode;
pub mod warmup;

use thiserror::Error;

use crate::config::ConfigError;
use crate::feed::SeriesError;

pub use cerebro::{Cerebro, RunResult, RunState};
pub use graph::{check_period, IndicatorError, IndicatorGraph, LineRef, NodeHandle};
pub use run_mode::{Batch, RunMode, RunModeKind, Stepped};
pub use warmup::{Phase, WarmupState};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no data feeds attached")]
    NoFeeds,

    #[error("feed '{name}' has {actual} bars, expected {expected} like the first feed")]
    FeedLengthMismatch {
        name: String,
        actual: usize,
        expected: usize,
    },

    #[error("desynchronised buffers at bar {bar}: {detail}")]
    Desync { bar: usize, detail: String },

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
