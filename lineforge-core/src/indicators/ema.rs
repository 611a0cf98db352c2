//! Exponential smoothing: EMA and Wilder's SMMA.
//!
//! Recursive: `out[t] = out[t-1] + alpha * (x[t] - out[t-1])`.
//! Seed: the first output is the SMA of the first `period` inputs.
//! EMA uses `alpha = 2 / (period + 1)`, SMMA uses `alpha = 1 / period`.
//! Minperiod: `period`.

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::formula::{Formula, Inputs};
use crate::indicators::sma::mean;

#[derive(Debug, Clone)]
pub struct ExpSmooth {
    label: &'static str,
    period: usize,
    alpha: f64,
    prev: f64,
}

impl ExpSmooth {
    pub fn with_alpha(label: &'static str, period: usize, alpha: f64) -> Result<Self, IndicatorError> {
        check_period(label, period)?;
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(IndicatorError::InvalidParameter {
                indicator: label,
                name: "alpha",
                reason: format!("must be in (0, 1], got {alpha}"),
            });
        }
        Ok(Self {
            label,
            period,
            alpha,
            prev: f64::NAN,
        })
    }

    pub fn ema(period: usize) -> Result<Self, IndicatorError> {
        Self::with_alpha("ema", period, 2.0 / (period as f64 + 1.0))
    }

    pub fn smma(period: usize) -> Result<Self, IndicatorError> {
        check_period("smma", period)?;
        Self::with_alpha("smma", period, 1.0 / period as f64)
    }
}

impl Formula for ExpSmooth {
    fn name(&self) -> String {
        format!("{}({})", self.label, self.period)
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn reset(&mut self) {
        self.prev = f64::NAN;
    }

    fn nextstart(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        self.prev = mean(inputs.window(0, self.period));
        out[0] = self.prev;
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        let x = inputs.get(0);
        if x.is_nan() {
            return;
        }
        if self.prev.is_nan() {
            // Seed window contained NaN: retry seeding from the current window.
            self.nextstart(inputs, out);
            return;
        }
        self.prev += self.alpha * (x - self.prev);
        out[0] = self.prev;
    }
}

pub fn ema(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    Ok(g.add(ExpSmooth::ema(period)?, &[input])?.out())
}

/// Wilder's smoothed moving average.
pub fn smma(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    Ok(g.add(ExpSmooth::smma(period)?, &[input])?.out())
}
