//! Moving-average crossover strategy.
//!
//! Buys when the fast SMA crosses above the slow SMA and exits when it
//! crosses below. With `long_only` unset the exit also opens a short.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::domain::position::SIZE_EPSILON;
use crate::domain::FeedId;
use crate::engine::{IndicatorError, LineRef};
use crate::indicators::crossover::cross_over;
use crate::indicators::sma::sma;
use crate::strategy::{InitContext, Strategy, StrategyContext};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SmaCrossParams {
    pub fast: usize,
    pub slow: usize,
    pub long_only: bool,
}

impl Default for SmaCrossParams {
    fn default() -> Self {
        Self {
            fast: 10,
            slow: 30,
            long_only: true,
        }
    }
}

impl SmaCrossParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fast == 0 || self.slow == 0 {
            return Err(ConfigError::Invalid(format!(
                "sma cross periods must be >= 1, got fast={} slow={}",
                self.fast, self.slow
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SmaCross {
    params: SmaCrossParams,
    feed: FeedId,
    cross: Option<LineRef>,
    signals: Vec<i8>,
}

impl SmaCross {
    pub fn new(params: SmaCrossParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            params,
            feed: FeedId(0),
            cross: None,
            signals: Vec::new(),
        })
    }

    pub fn params(&self) -> SmaCrossParams {
        self.params
    }

    /// One entry per bar of the last run: +1 cross up, -1 cross down, else 0.
    pub fn signals(&self) -> &[i8] {
        &self.signals
    }

    /// Whether `exposure` already matches what `signal` asks for.
    fn satisfied(&self, signal: i8, exposure: f64) -> bool {
        if signal > 0 {
            exposure > SIZE_EPSILON
        } else {
            exposure < -SIZE_EPSILON || (self.params.long_only && exposure.abs() <= SIZE_EPSILON)
        }
    }

    fn signal(&self, ctx: &StrategyContext<'_>) -> i8 {
        let Some(cross) = self.cross else {
            return 0;
        };
        let value = ctx.value(cross, 0);
        if value > 0.0 {
            1
        } else if value < 0.0 {
            -1
        } else {
            0
        }
    }
}

impl Strategy for SmaCross {
    fn init(&mut self, ctx: &mut InitContext<'_>) -> Result<(), IndicatorError> {
        self.signals.clear();
        let close = ctx.data(self.feed).close;
        let g = ctx.graph();
        let fast = sma(g, close, self.params.fast)?;
        let slow = sma(g, close, self.params.slow)?;
        self.cross = Some(cross_over(g, fast, slow)?);
        Ok(())
    }

    fn prenext(&mut self, _ctx: &mut StrategyContext<'_>) {
        self.signals.push(0);
    }

    fn next(&mut self, ctx: &mut StrategyContext<'_>) {
        let signal = self.signal(ctx);
        self.signals.push(signal);
        if signal == 0 {
            return;
        }
        if self.satisfied(signal, ctx.exposure(self.feed)) {
            return;
        }
        // Orders from the previous bar have not filled yet; a reversal
        // withdraws them first. What is left is the held position, which
        // may already point the right way.
        let pending: Vec<_> = ctx.pending_orders(self.feed).iter().map(|o| o.id).collect();
        for id in pending {
            ctx.cancel(id);
        }
        if self.satisfied(signal, ctx.exposure(self.feed)) {
            return;
        }
        ctx.flatten(self.feed);
        if signal == 1 || !self.params.long_only {
            let entry = if signal == 1 {
                ctx.buy(self.feed)
            } else {
                ctx.sell(self.feed)
            };
            if entry.is_none() {
                log::debug!("{} sized to zero at bar {}", self.name(), ctx.bar());
            }
        }
    }

    fn name(&self) -> &str {
        "sma_cross"
    }
}
