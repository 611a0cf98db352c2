//! Warmup tracking — which strategy callback a bar belongs to.

use serde::{Deserialize, Serialize};

/// Callback phase of one bar relative to the strategy minperiod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Some indicator is still warming up.
    Prenext,
    /// First bar on which every indicator is defined.
    NextStart,
    Next,
}

/// Warmup state tracker
#[derive(Debug, Clone)]
pub struct WarmupState {
    minperiod: usize,
    bars_processed: usize,
}

impl WarmupState {
    /// `minperiod` is clamped to at least 1.
    pub fn new(minperiod: usize) -> Self {
        Self {
            minperiod: minperiod.max(1),
            bars_processed: 0,
        }
    }

    pub fn minperiod(&self) -> usize {
        self.minperiod
    }

    /// Count one more bar and return its phase.
    pub fn process_bar(&mut self) -> Phase {
        self.bars_processed += 1;
        match self.bars_processed.cmp(&self.minperiod) {
            std::cmp::Ordering::Less => Phase::Prenext,
            std::cmp::Ordering::Equal => Phase::NextStart,
            std::cmp::Ordering::Greater => Phase::Next,
        }
    }

    pub fn is_warm(&self) -> bool {
        self.bars_processed >= self.minperiod
    }

    pub fn bars_until_warm(&self) -> usize {
        self.minperiod.saturating_sub(self.bars_processed)
    }
}
