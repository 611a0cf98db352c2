//! True Strength Index.
//!
//! `pc = x − x(−pchange)`, double-smoothed by EMA(period1) then
//! EMA(period2): `tsi = 100 · ds(pc) / ds(|pc|)`.
//! Minperiod `pchange + period1 + period2 − 1` (38 by default).

use serde::{Deserialize, Serialize};

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::basicops::{abs, affine, div};
use crate::indicators::ema::ema;
use crate::indicators::momentum::momentum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TsiParams {
    pub period1: usize,
    pub period2: usize,
    pub pchange: usize,
}

impl Default for TsiParams {
    fn default() -> Self {
        Self {
            period1: 25,
            period2: 13,
            pchange: 1,
        }
    }
}

impl TsiParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        check_period("tsi", self.period1)?;
        check_period("tsi", self.period2)?;
        check_period("tsi", self.pchange)?;
        Ok(())
    }
}

pub fn tsi(g: &mut IndicatorGraph, input: LineRef, params: TsiParams) -> Result<LineRef, IndicatorError> {
    params.validate()?;
    let pc = momentum(g, input, params.pchange)?;
    let apc = abs(g, pc)?;
    let double_smooth = |g: &mut IndicatorGraph, line: LineRef| -> Result<LineRef, IndicatorError> {
        let first = ema(g, line, params.period1)?;
        ema(g, first, params.period2)
    };
    let num = double_smooth(g, pc)?;
    let den = double_smooth(g, apc)?;
    let ratio = div(g, num, den)?;
    affine(g, ratio, 100.0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, eval_close, leading_nans};

    #[test]
    fn tsi_default_warmup_and_bounds() {
        let closes: Vec<f64> = (0..80).map(|i| 50.0 + (i as f64 * 0.2).sin() * 3.0).collect();
        let t = eval_close(&closes, |g, p| Ok(vec![tsi(g, p.close, TsiParams::default())?]));
        assert_eq!(leading_nans(&t), 37);
        assert!(t[37..].iter().all(|v| (-100.0..=100.0).contains(v)));
    }

    #[test]
    fn monotonic_rise_is_100() {
        let closes: Vec<f64> = (0..60).map(|i| i as f64 * 2.0).collect();
        let t = eval_close(&closes, |g, p| Ok(vec![tsi(g, p.close, TsiParams::default())?]));
        assert_approx(t[59], 100.0, 1e-9);
    }
}
