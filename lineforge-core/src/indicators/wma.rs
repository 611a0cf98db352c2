//! Weighted Moving Average (WMA).
//!
//! Linear weights 1..=period, newest sample heaviest. Minperiod: `period`.

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::formula::{Formula, Inputs};

#[derive(Debug, Clone)]
pub struct Wma {
    period: usize,
    norm: f64,
}

impl Wma {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("wma", period)?;
        let p = period as f64;
        Ok(Self {
            period,
            norm: p * (p + 1.0) / 2.0,
        })
    }
}

impl Formula for Wma {
    fn name(&self) -> String {
        format!("wma({})", self.period)
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        let window = inputs.window(0, self.period);
        if window.is_empty() {
            return;
        }
        let weighted: f64 = window
            .iter()
            .enumerate()
            .map(|(i, v)| (i + 1) as f64 * v)
            .sum();
        out[0] = weighted / self.norm;
    }
}

pub fn wma(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    Ok(g.add(Wma::new(period)?, &[input])?.out())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, eval_close, leading_nans, DEFAULT_EPSILON};

    #[test]
    fn wma_weights_newest_most() {
        let result = eval_close(&[1.0, 2.0, 3.0, 4.0], |g, p| Ok(vec![wma(g, p.close, 3)?]));
        assert_eq!(leading_nans(&result), 2);
        // (1*1 + 2*2 + 3*3) / 6
        assert_approx(result[2], 14.0 / 6.0, DEFAULT_EPSILON);
        assert_approx(result[3], 20.0 / 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn wma_period_one_is_identity() {
        let result = eval_close(&[1.0, 2.0, 5.0], |g, p| Ok(vec![wma(g, p.close, 1)?]));
        assert_eq!(result, vec![1.0, 2.0, 5.0]);
    }
}
