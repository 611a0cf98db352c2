//! Double and triple exponential moving averages.
//!
//! DEMA = 2·EMA − EMA(EMA), minperiod `2p − 1`.
//! TEMA = 3·EMA − 3·EMA(EMA) + EMA(EMA(EMA)), minperiod `3p − 2`.

use crate::engine::{IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::basicops::{combine, sub};
use crate::indicators::ema::ema;

pub fn dema(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    let e1 = ema(g, input, period)?;
    let e2 = ema(g, e1, period)?;
    combine(g, e1, 2.0, e2, -1.0)
}

pub fn tema(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    let e1 = ema(g, input, period)?;
    let e2 = ema(g, e1, period)?;
    let e3 = ema(g, e2, period)?;
    // 3·(e1 − e2) + e3
    let diff = sub(g, e1, e2)?;
    combine(g, diff, 3.0, e3, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, eval_close, leading_nans};

    #[test]
    fn dema_tema_warmup() {
        let closes: Vec<f64> = (0..40).map(|i| 50.0 + (i as f64 * 0.3).sin()).collect();
        let d = eval_close(&closes, |g, p| Ok(vec![dema(g, p.close, 5)?]));
        assert_eq!(leading_nans(&d), 8);
        let t = eval_close(&closes, |g, p| Ok(vec![tema(g, p.close, 5)?]));
        assert_eq!(leading_nans(&t), 12);
    }

    #[test]
    fn linear_trend_is_tracked_without_lag() {
        // For a line, DEMA removes the EMA lag once both stages settle.
        let closes: Vec<f64> = (0..200).map(f64::from).collect();
        let d = eval_close(&closes, |g, p| Ok(vec![dema(g, p.close, 5)?]));
        assert_approx(d[199], 199.0, 1e-6);
        let t = eval_close(&closes, |g, p| Ok(vec![tema(g, p.close, 5)?]));
        assert_approx(t[199], 199.0, 1e-6);
    }
}
