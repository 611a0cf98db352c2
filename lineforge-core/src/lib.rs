//! Lineforge Core — line buffers, indicator graph, broker and the bar loop.
//!
//! This crate contains the whole backtesting engine:
//! - Line buffers and data series advanced in lockstep
//! - An indicator DAG with exact minimum-period semantics
//! - A broker with order, position and trade state machines
//! - The strategy runtime and the `Cerebro` driver with stepped and batch run modes
//! - A numeric function surface over plain slices (`ta`)

pub mod broker;
pub mod config;
pub mod domain;
pub mod engine;
pub mod feed;
pub mod indicators;
pub mod lines;
pub mod sizers;
pub mod strategy;
pub mod ta;

pub use config::{CerebroConfig, ConfigError};
pub use engine::{Cerebro, EngineError, RunModeKind, RunResult};
pub use strategy::{simple_moving_average_strategy, Strategy, StrategyReport};
