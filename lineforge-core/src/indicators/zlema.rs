//! Zero-lag exponential moving average.
//!
//! EMA over `2·x − x(−lag)` with `lag = (period − 1) / 2`.

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::ema::ema;
use crate::indicators::formula::{Formula, Inputs};

/// `2·x − x(−lag)`.
#[derive(Debug, Clone)]
pub struct ZeroLag {
    lag: usize,
}

impl Formula for ZeroLag {
    fn name(&self) -> String {
        format!("zerolag({})", self.lag)
    }

    fn lookback(&self) -> usize {
        self.lag
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        out[0] = 2.0 * inputs.get(0) - inputs.at(0, -(self.lag as isize));
    }
}

pub fn zlema(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    check_period("zlema", period)?;
    let lag = (period - 1) / 2;
    let adjusted = g.add(ZeroLag { lag }, &[input])?.out();
    ema(g, adjusted, period)
}
