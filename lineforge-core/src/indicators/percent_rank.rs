//! PercentRank and DV2.
//!
//! PercentRank: share of the trailing `period` samples strictly below the
//! current one, in `[0, 1]`. Minperiod `period`.
//!
//! DV2: `100 · PercentRank(MA(close / median − 1, maperiod), period)`.
//! Minperiod `period + maperiod − 1` (253 by default).

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::basicops::{affine, div};
use crate::indicators::formula::{Formula, Inputs};
use crate::indicators::movav::MovAv;
use crate::indicators::price::median_price;
use crate::indicators::PriceLines;

#[derive(Debug, Clone)]
pub struct PercentRank {
    period: usize,
}

impl PercentRank {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("percent_rank", period)?;
        Ok(Self { period })
    }
}

impl Formula for PercentRank {
    fn name(&self) -> String {
        format!("percent_rank({})", self.period)
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        let window = inputs.window(0, self.period);
        if window.is_empty() || window.iter().any(|v| v.is_nan()) {
            return;
        }
        let current = window[window.len() - 1];
        let below = window.iter().filter(|&&v| v < current).count();
        out[0] = below as f64 / self.period as f64;
    }
}

pub fn percent_rank(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    Ok(g.add(PercentRank::new(period)?, &[input])?.out())
}

pub fn dv2(
    g: &mut IndicatorGraph,
    p: PriceLines,
    period: usize,
    maperiod: usize,
    movav: MovAv,
) -> Result<LineRef, IndicatorError> {
    let median = median_price(g, p)?;
    let ratio = div(g, p.close, median)?;
    let chl = affine(g, ratio, 1.0, -1.0)?;
    let dvu = movav.build(g, chl, maperiod)?;
    let rank = percent_rank(g, dvu, period)?;
    affine(g, rank, 100.0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, eval, eval_close, leading_nans, make_bars, DEFAULT_EPSILON};

    #[test]
    fn rank_counts_strictly_lower() {
        let r = eval_close(&[3.0, 1.0, 2.0, 2.0], |g, p| Ok(vec![percent_rank(g, p.close, 4)?]));
        assert_eq!(leading_nans(&r), 3);
        assert_approx(r[3], 0.25, DEFAULT_EPSILON);
    }

    #[test]
    fn rank_stays_in_unit_interval() {
        let closes: Vec<f64> = (0..80).map(|i| (i as f64 * 0.9).sin()).collect();
        let r = eval_close(&closes, |g, p| Ok(vec![percent_rank(g, p.close, 50)?]));
        assert_eq!(leading_nans(&r), 49);
        assert!(r[49..].iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn dv2_default_warmup() {
        let closes: Vec<f64> = (0..260).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let lines = eval(make_bars(&closes), |g, p| Ok(vec![dv2(g, p, 252, 2, MovAv::Sma)?]));
        assert_eq!(leading_nans(&lines[0]), 252);
        assert!(lines[0][252..].iter().all(|v| (0.0..=100.0).contains(v)));
    }
}
