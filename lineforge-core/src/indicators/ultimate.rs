//! Ultimate Oscillator.
//!
//! `bp = close − TrueLow`, `av_n = Σbp(n) / ΣTR(n)`,
//! `uo = 100 · (4·av_p1 + 2·av_p2 + av_p3) / 7`.
//! Minperiod `max(p1, p2, p3) + 1` (29 by default).

use serde::{Deserialize, Serialize};

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::atr::{true_low, true_range};
use crate::indicators::basicops::{affine, combine, div, sub, sum_n};
use crate::indicators::PriceLines;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct UltimateParams {
    pub p1: usize,
    pub p2: usize,
    pub p3: usize,
}

impl Default for UltimateParams {
    fn default() -> Self {
        Self { p1: 7, p2: 14, p3: 28 }
    }
}

impl UltimateParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        check_period("ultimate", self.p1)?;
        check_period("ultimate", self.p2)?;
        check_period("ultimate", self.p3)?;
        Ok(())
    }
}

pub fn ultimate_oscillator(
    g: &mut IndicatorGraph,
    p: PriceLines,
    params: UltimateParams,
) -> Result<LineRef, IndicatorError> {
    params.validate()?;
    let tl = true_low(g, p)?;
    let bp = sub(g, p.close, tl)?;
    let tr = true_range(g, p)?;
    let average = |g: &mut IndicatorGraph, n: usize| -> Result<LineRef, IndicatorError> {
        let num = sum_n(g, bp, n)?;
        let den = sum_n(g, tr, n)?;
        div(g, num, den)
    };
    let av1 = average(g, params.p1)?;
    let av2 = average(g, params.p2)?;
    let av3 = average(g, params.p3)?;
    let fast = combine(g, av1, 4.0, av2, 2.0)?;
    let total = combine(g, fast, 1.0, av3, 1.0)?;
    affine(g, total, 100.0 / 7.0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{eval, leading_nans, make_bars};

    #[test]
    fn default_warmup_and_range() {
        let closes: Vec<f64> = (0..50).map(|i| 20.0 + (i as f64 * 0.4).sin() * 2.0).collect();
        let lines = eval(make_bars(&closes), |g, p| {
            Ok(vec![ultimate_oscillator(g, p, UltimateParams::default())?])
        });
        assert_eq!(leading_nans(&lines[0]), 28);
        assert!(lines[0][28..].iter().all(|v| (0.0..=100.0).contains(v)));
    }
}
