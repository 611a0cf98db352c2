//! Stochastic oscillators.
//!
//! Raw `%K = 100 · (close − LL(p)) / (HH(p) − LL(p))`.
//!
//! - Fast: `k = raw %K`, `d = SMA(k, period_dfast)`. Minperiod `p + d − 1`.
//! - Slow: `k = SMA(raw, period_dfast)`, `d = SMA(k, period_dslow)`.
//! - Full: `k = raw %K`, `d = SMA(k, period_dfast)`, `dslow = SMA(d, period_dslow)`.
//!
//! A flat window (zero range) yields NaN.

use serde::{Deserialize, Serialize};

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::basicops::{affine, div, highest, lowest, sub};
use crate::indicators::movav::MovAv;
use crate::indicators::PriceLines;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct StochasticParams {
    pub period: usize,
    pub period_dfast: usize,
    pub period_dslow: usize,
    pub movav: MovAv,
}

impl Default for StochasticParams {
    fn default() -> Self {
        Self {
            period: 14,
            period_dfast: 3,
            period_dslow: 3,
            movav: MovAv::Sma,
        }
    }
}

impl StochasticParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        check_period("stochastic", self.period)?;
        check_period("stochastic", self.period_dfast)?;
        check_period("stochastic", self.period_dslow)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StochasticLines {
    pub k: LineRef,
    pub d: LineRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StochasticFullLines {
    pub k: LineRef,
    pub d: LineRef,
    pub dslow: LineRef,
}

/// Raw `%K` over `period` bars.
pub fn raw_k(g: &mut IndicatorGraph, p: PriceLines, period: usize) -> Result<LineRef, IndicatorError> {
    let hh = highest(g, p.high, period)?;
    let ll = lowest(g, p.low, period)?;
    let num = sub(g, p.close, ll)?;
    let den = sub(g, hh, ll)?;
    let ratio = div(g, num, den)?;
    affine(g, ratio, 100.0, 0.0)
}

pub fn stochastic_fast(
    g: &mut IndicatorGraph,
    p: PriceLines,
    params: StochasticParams,
) -> Result<StochasticLines, IndicatorError> {
    params.validate()?;
    let k = raw_k(g, p, params.period)?;
    let d = params.movav.build(g, k, params.period_dfast)?;
    Ok(StochasticLines { k, d })
}

pub fn stochastic(
    g: &mut IndicatorGraph,
    p: PriceLines,
    params: StochasticParams,
) -> Result<StochasticLines, IndicatorError> {
    params.validate()?;
    let raw = raw_k(g, p, params.period)?;
    let k = params.movav.build(g, raw, params.period_dfast)?;
    let d = params.movav.build(g, k, params.period_dslow)?;
    Ok(StochasticLines { k, d })
}

pub fn stochastic_full(
    g: &mut IndicatorGraph,
    p: PriceLines,
    params: StochasticParams,
) -> Result<StochasticFullLines, IndicatorError> {
    params.validate()?;
    let k = raw_k(g, p, params.period)?;
    let d = params.movav.build(g, k, params.period_dfast)?;
    let dslow = params.movav.build(g, d, params.period_dslow)?;
    Ok(StochasticFullLines { k, d, dslow })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use crate::indicators::{assert_approx, eval, leading_nans, make_bars, DEFAULT_EPSILON};

    fn wave(n: usize) -> Vec<Bar> {
        make_bars(&(0..n).map(|i| 100.0 + (i as f64 * 0.3).sin() * 8.0).collect::<Vec<_>>())
    }

    #[test]
    fn default_warmups() {
        let lines = eval(wave(40), |g, p| {
            let f = stochastic_fast(g, p, StochasticParams::default())?;
            let s = stochastic(g, p, StochasticParams::default())?;
            let full = stochastic_full(g, p, StochasticParams::default())?;
            Ok(vec![f.k, f.d, s.k, s.d, full.dslow])
        });
        assert_eq!(leading_nans(&lines[0]), 13);
        assert_eq!(leading_nans(&lines[1]), 15);
        assert_eq!(leading_nans(&lines[2]), 15);
        assert_eq!(leading_nans(&lines[3]), 17);
        assert_eq!(leading_nans(&lines[4]), 17);
        assert!(lines[0][13..].iter().all(|v| (0.0..=100.0).contains(v)));
    }

    #[test]
    fn slow_k_is_full_d() {
        let lines = eval(wave(30), |g, p| {
            let s = stochastic(g, p, StochasticParams::default())?;
            let full = stochastic_full(g, p, StochasticParams::default())?;
            Ok(vec![s.k, full.d, s.d, full.dslow])
        });
        for i in 17..30 {
            assert_eq!(lines[0][i].to_bits(), lines[1][i].to_bits());
            assert_eq!(lines[2][i].to_bits(), lines[3][i].to_bits());
        }
    }

    #[test]
    fn close_at_high_reads_100() {
        let lines = eval(make_bars(&[1.0, 2.0, 3.0, 4.0]), |g, p| {
            let f = stochastic_fast(
                g,
                p,
                StochasticParams {
                    period: 3,
                    ..StochasticParams::default()
                },
            )?;
            Ok(vec![f.k])
        });
        // window bars 1..=3: HH 5, LL = 1 - 1 = 0
        assert_approx(lines[0][3], 80.0, DEFAULT_EPSILON);
    }
}
