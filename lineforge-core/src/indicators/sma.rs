//! Simple Moving Average (SMA).
//!
//! Mean of the trailing `period` samples. Minperiod: `period`.

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::formula::{Formula, Inputs};

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        Ok(Self {
            period: check_period("sma", period)?,
        })
    }
}

/// Mean of `window`, NaN if any sample is NaN.
pub(crate) fn mean(window: &[f64]) -> f64 {
    if window.is_empty() || window.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    window.iter().sum::<f64>() / window.len() as f64
}

impl Formula for Sma {
    fn name(&self) -> String {
        format!("sma({})", self.period)
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        out[0] = mean(inputs.window(0, self.period));
    }
}

pub fn sma(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    Ok(g.add(Sma::new(period)?, &[input])?.out())
}
