//! Relative Strength Index and Relative Momentum Index.
//!
//! `UpDay = max(x − x(−l), 0)`, `DownDay = max(x(−l) − x, 0)`, each smoothed
//! with a moving average (Wilder's by default), then
//! `RSI = 100 − 100 / (1 + up / down)`.
//!
//! Minperiod: `l + period` (15 for the default RSI(14), 25 for RMI(20, 5)).
//! A zero average loss reads 100; both averages zero read 50.

use serde::{Deserialize, Serialize};

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::formula::{Formula, Inputs};
use crate::indicators::movav::MovAv;

/// Positive or negative part of an `l`-bar change.
#[derive(Debug, Clone)]
pub struct UpDown {
    up: bool,
    lookback: usize,
}

impl UpDown {
    pub fn up(lookback: usize) -> Result<Self, IndicatorError> {
        check_period("upday", lookback)?;
        Ok(Self { up: true, lookback })
    }

    pub fn down(lookback: usize) -> Result<Self, IndicatorError> {
        check_period("downday", lookback)?;
        Ok(Self { up: false, lookback })
    }
}

impl Formula for UpDown {
    fn name(&self) -> String {
        let label = if self.up { "upday" } else { "downday" };
        format!("{label}({})", self.lookback)
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        let delta = inputs.get(0) - inputs.at(0, -(self.lookback as isize));
        if delta.is_nan() {
            return;
        }
        out[0] = if self.up { delta.max(0.0) } else { (-delta).max(0.0) };
    }
}

/// `100 − 100 / (1 + up / down)` over two averaged lines.
#[derive(Debug, Clone, Default)]
pub struct StrengthIndex;

pub(crate) fn strength(up: f64, down: f64) -> f64 {
    if up.is_nan() || down.is_nan() {
        f64::NAN
    } else if down == 0.0 {
        if up == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - 100.0 / (1.0 + up / down)
    }
}

impl Formula for StrengthIndex {
    fn name(&self) -> String {
        "strength".to_string()
    }

    fn arity(&self) -> usize {
        2
    }

    fn lookback(&self) -> usize {
        0
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        out[0] = strength(inputs.get(0), inputs.get(1));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RsiParams {
    pub period: usize,
    /// Bars over which each up/down move is measured.
    pub lookback: usize,
    pub movav: MovAv,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            period: 14,
            lookback: 1,
            movav: MovAv::Smma,
        }
    }
}

impl RsiParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        check_period("rsi", self.period)?;
        check_period("rsi", self.lookback)?;
        Ok(())
    }

    /// RMI defaults: period 20, lookback 5.
    pub fn rmi() -> Self {
        Self {
            period: 20,
            lookback: 5,
            ..Self::default()
        }
    }
}

pub fn rsi_with(g: &mut IndicatorGraph, input: LineRef, params: RsiParams) -> Result<LineRef, IndicatorError> {
    params.validate()?;
    let up = g.add(UpDown::up(params.lookback)?, &[input])?.out();
    let down = g.add(UpDown::down(params.lookback)?, &[input])?.out();
    let up_avg = params.movav.build(g, up, params.period)?;
    let down_avg = params.movav.build(g, down, params.period)?;
    Ok(g.add(StrengthIndex, &[up_avg, down_avg])?.out())
}

/// Wilder RSI over 1-bar changes.
pub fn rsi(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    rsi_with(
        g,
        input,
        RsiParams {
            period,
            ..RsiParams::default()
        },
    )
}

/// Relative Momentum Index: RSI over `lookback`-bar changes.
pub fn rmi(
    g: &mut IndicatorGraph,
    input: LineRef,
    period: usize,
    lookback: usize,
) -> Result<LineRef, IndicatorError> {
    rsi_with(
        g,
        input,
        RsiParams {
            period,
            lookback,
            movav: MovAv::Smma,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, eval_close, leading_nans, DEFAULT_EPSILON};

    #[test]
    fn rsi_all_gains_is_100() {
        let closes: Vec<f64> = (1..=30).map(f64::from).collect();
        let r = eval_close(&closes, |g, p| Ok(vec![rsi(g, p.close, 14)?]));
        assert_eq!(leading_nans(&r), 14);
        assert!(r[14..].iter().all(|v| (*v - 100.0).abs() < DEFAULT_EPSILON));
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (1..=30).rev().map(f64::from).collect();
        let r = eval_close(&closes, |g, p| Ok(vec![rsi(g, p.close, 14)?]));
        assert!(r[14..].iter().all(|v| v.abs() < DEFAULT_EPSILON));
    }

    #[test]
    fn rsi_flat_is_50() {
        let r = eval_close(&[42.0; 20], |g, p| Ok(vec![rsi(g, p.close, 5)?]));
        assert_approx(r[19], 50.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_first_value_uses_simple_averages() {
        // Changes: +2, -1, +3 -> up mean 5/3, down mean 1/3
        let r = eval_close(&[10.0, 12.0, 11.0, 14.0], |g, p| Ok(vec![rsi(g, p.close, 3)?]));
        assert_eq!(leading_nans(&r), 3);
        assert_approx(r[3], 100.0 - 100.0 / (1.0 + 5.0), 1e-9);
    }

    #[test]
    fn rmi_warmup() {
        let closes: Vec<f64> = (0..40).map(|i| (i as f64 * 0.5).sin() * 10.0 + 50.0).collect();
        let r = eval_close(&closes, |g, p| Ok(vec![rmi(g, p.close, 20, 5)?]));
        assert_eq!(leading_nans(&r), 24);
        assert!(r[24..].iter().all(|v| (0.0..=100.0).contains(v)));
    }
}
