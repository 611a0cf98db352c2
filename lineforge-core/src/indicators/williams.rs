//! Williams %R and Williams Accumulation/Distribution.
//!
//! %R: `-100 · (HH(p) − close) / (HH(p) − LL(p))`, in [−100, 0]. Minperiod `p`.
//!
//! A/D accumulates, from the second bar on, `close − TrueLow` on up closes
//! and `close − TrueHigh` on down closes (zero when unchanged). Minperiod 2.

use crate::engine::{IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::atr::true_bounds;
use crate::indicators::basicops::{affine, div, highest, lowest, sub};
use crate::indicators::formula::{Formula, Inputs};
use crate::indicators::PriceLines;

pub fn williams_r(g: &mut IndicatorGraph, p: PriceLines, period: usize) -> Result<LineRef, IndicatorError> {
    let hh = highest(g, p.high, period)?;
    let ll = lowest(g, p.low, period)?;
    let num = sub(g, hh, p.close)?;
    let den = sub(g, hh, ll)?;
    let ratio = div(g, num, den)?;
    affine(g, ratio, -100.0, 0.0)
}

/// Inputs: high, low, close.
#[derive(Debug, Clone, Default)]
pub struct WilliamsAd {
    total: f64,
}

impl Formula for WilliamsAd {
    fn name(&self) -> String {
        "williams_ad".to_string()
    }

    fn arity(&self) -> usize {
        3
    }

    fn lookback(&self) -> usize {
        1
    }

    fn reset(&mut self) {
        self.total = 0.0;
    }

    fn nextstart(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        self.total = 0.0;
        self.next(inputs, out);
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        let (high, low, close) = (inputs.get(0), inputs.get(1), inputs.get(2));
        let prev = inputs.at(2, -1);
        let (th, tl) = true_bounds(high, low, prev);
        let step = if close > prev {
            close - tl
        } else if close < prev {
            close - th
        } else {
            0.0
        };
        if step.is_nan() || close.is_nan() {
            return;
        }
        self.total += step;
        out[0] = self.total;
    }
}

pub fn williams_ad(g: &mut IndicatorGraph, p: PriceLines) -> Result<LineRef, IndicatorError> {
    Ok(g.add(WilliamsAd::default(), &[p.high, p.low, p.close])?.out())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, eval, leading_nans, make_bars, DEFAULT_EPSILON};

    #[test]
    fn williams_r_range() {
        let closes: Vec<f64> = (0..30).map(|i| 50.0 + (i as f64 * 0.5).sin() * 5.0).collect();
        let lines = eval(make_bars(&closes), |g, p| Ok(vec![williams_r(g, p, 14)?]));
        assert_eq!(leading_nans(&lines[0]), 13);
        assert!(lines[0][13..].iter().all(|v| (-100.0..=0.0).contains(v)));
    }

    #[test]
    fn williams_r_known_value() {
        // Bars 1..=3 of make_bars([1,2,3,4]): HH 5, LL 0, close 4
        let lines = eval(make_bars(&[1.0, 2.0, 3.0, 4.0]), |g, p| Ok(vec![williams_r(g, p, 3)?]));
        assert_approx(lines[0][3], -20.0, DEFAULT_EPSILON);
    }

    #[test]
    fn accumulation_distribution_sums_moves() {
        // Bar 1: up close 12, prev close 10, low 9 -> TrueLow 9, step 3
        // Bar 2: down close 11, high 13 -> TrueHigh 13, step -2
        // Bar 3: unchanged close, step 0
        let lines = eval(make_bars(&[10.0, 12.0, 11.0, 11.0]), |g, p| Ok(vec![williams_ad(g, p)?]));
        assert_eq!(leading_nans(&lines[0]), 1);
        assert_approx(lines[0][1], 3.0, DEFAULT_EPSILON);
        assert_approx(lines[0][2], 1.0, DEFAULT_EPSILON);
        assert_approx(lines[0][3], 1.0, DEFAULT_EPSILON);
    }
}
