//! Laguerre RSI and the Laguerre filter (Ehlers).
//!
//! A four-stage Laguerre recursion with damping `gamma` runs over every
//! input sample from the first one. The RSI form reports
//! `cu / (cu + cd)` over the stage differences (1 when flat) and is
//! published from bar `period − 1`; the filter reports
//! `(L0 + 2·L1 + 2·L2 + L3) / 6` from the first bar.

use serde::{Deserialize, Serialize};

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::formula::{Formula, Inputs};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LaguerreParams {
    pub gamma: f64,
    /// Warm-up bars before the RSI form publishes.
    pub period: usize,
}

impl Default for LaguerreParams {
    fn default() -> Self {
        Self { gamma: 0.5, period: 6 }
    }
}

impl LaguerreParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        check_period("laguerre", self.period)?;
        if !(0.0..1.0).contains(&self.gamma) {
            return Err(IndicatorError::InvalidParameter {
                indicator: "laguerre",
                name: "gamma",
                reason: format!("must be in [0, 1), got {}", self.gamma),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Stages {
    l: [f64; 4],
}

impl Stages {
    fn step(&mut self, gamma: f64, x: f64) {
        let [l0, l1, l2, l3] = self.l;
        let n0 = (1.0 - gamma) * x + gamma * l0;
        let n1 = -gamma * n0 + l0 + gamma * l1;
        let n2 = -gamma * n1 + l1 + gamma * l2;
        let n3 = -gamma * n2 + l2 + gamma * l3;
        self.l = [n0, n1, n2, n3];
    }

    fn rsi(&self) -> f64 {
        let (mut cu, mut cd) = (0.0, 0.0);
        for pair in self.l.windows(2) {
            let d = pair[0] - pair[1];
            if d >= 0.0 {
                cu += d;
            } else {
                cd -= d;
            }
        }
        let den = cu + cd;
        if den == 0.0 { 1.0 } else { cu / den }
    }

    fn filter(&self) -> f64 {
        let [l0, l1, l2, l3] = self.l;
        (l0 + 2.0 * l1 + 2.0 * l2 + l3) / 6.0
    }
}

#[derive(Debug, Clone)]
pub struct Laguerre {
    params: LaguerreParams,
    as_rsi: bool,
    stages: Stages,
}

impl Laguerre {
    pub fn rsi(params: LaguerreParams) -> Result<Self, IndicatorError> {
        params.validate()?;
        Ok(Self {
            params,
            as_rsi: true,
            stages: Stages::default(),
        })
    }

    pub fn filter(gamma: f64) -> Result<Self, IndicatorError> {
        let params = LaguerreParams { gamma, period: 1 };
        params.validate()?;
        Ok(Self {
            params,
            as_rsi: false,
            stages: Stages::default(),
        })
    }

    fn feed(&mut self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        self.stages.step(self.params.gamma, x);
        if self.as_rsi {
            self.stages.rsi()
        } else {
            self.stages.filter()
        }
    }
}

impl Formula for Laguerre {
    fn name(&self) -> String {
        if self.as_rsi {
            format!("lrsi({}, {})", self.params.gamma, self.params.period)
        } else {
            format!("laguerre_filter({})", self.params.gamma)
        }
    }

    fn lookback(&self) -> usize {
        if self.as_rsi { self.params.period - 1 } else { 0 }
    }

    fn reset(&mut self) {
        self.stages = Stages::default();
    }

    /// Replays the samples before the first published bar.
    fn nextstart(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        let history = inputs.line(0).as_slice();
        let mut last = f64::NAN;
        for &x in history {
            last = self.feed(x);
        }
        out[0] = last;
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        out[0] = self.feed(inputs.get(0));
    }
}

pub fn laguerre_rsi(
    g: &mut IndicatorGraph,
    input: LineRef,
    params: LaguerreParams,
) -> Result<LineRef, IndicatorError> {
    Ok(g.add(Laguerre::rsi(params)?, &[input])?.out())
}

pub fn laguerre_filter(g: &mut IndicatorGraph, input: LineRef, gamma: f64) -> Result<LineRef, IndicatorError> {
    Ok(g.add(Laguerre::filter(gamma)?, &[input])?.out())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, eval_close, leading_nans, DEFAULT_EPSILON};

    #[test]
    fn lrsi_warmup_and_range() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let r = eval_close(&closes, |g, p| Ok(vec![laguerre_rsi(g, p.close, LaguerreParams::default())?]));
        assert_eq!(leading_nans(&r), 5);
        assert!(r[5..].iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn lrsi_rising_series_saturates() {
        let closes: Vec<f64> = (1..=20).map(f64::from).collect();
        let r = eval_close(&closes, |g, p| Ok(vec![laguerre_rsi(g, p.close, LaguerreParams::default())?]));
        assert_approx(r[19], 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn filter_starts_at_first_bar() {
        let f = eval_close(&[6.0, 6.0], |g, p| Ok(vec![laguerre_filter(g, p.close, 0.5)?]));
        assert_eq!(leading_nans(&f), 0);
        // L0 = 3, L1 = -1.5 + 0 = -1.5, L2 = 0.75, L3 = -0.375
        assert_approx(f[0], (3.0 - 3.0 + 1.5 - 0.375) / 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn gamma_out_of_range() {
        assert!(Laguerre::filter(1.0).is_err());
        assert!(Laguerre::filter(-0.1).is_err());
    }
}
