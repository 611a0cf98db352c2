//! TRIX — rate of change of a triple-smoothed EMA.
//!
//! `trix = 100 · (E3 − E3(−1)) / E3(−1)` with `E3 = EMA(EMA(EMA(x)))`, and
//! `signal = EMA(trix, sigperiod)`. Minperiod `3p − 1` (44 for p = 15).

use serde::{Deserialize, Serialize};

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::ema::ema;
use crate::indicators::roc::roc100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TrixParams {
    pub period: usize,
    pub sigperiod: usize,
}

impl Default for TrixParams {
    fn default() -> Self {
        Self {
            period: 15,
            sigperiod: 9,
        }
    }
}

impl TrixParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        check_period("trix", self.period)?;
        check_period("trix", self.sigperiod)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrixLines {
    pub trix: LineRef,
    pub signal: LineRef,
}

pub fn trix(g: &mut IndicatorGraph, input: LineRef, params: TrixParams) -> Result<TrixLines, IndicatorError> {
    params.validate()?;
    let e1 = ema(g, input, params.period)?;
    let e2 = ema(g, e1, params.period)?;
    let e3 = ema(g, e2, params.period)?;
    let line = roc100(g, e3, 1)?;
    let signal = ema(g, line, params.sigperiod)?;
    Ok(TrixLines { trix: line, signal })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, eval_close, leading_nans, DEFAULT_EPSILON};

    #[test]
    fn trix_default_warmup() {
        let closes: Vec<f64> = (0..70).map(|i| 100.0 + (i as f64 * 0.1).sin()).collect();
        let t = eval_close(&closes, |g, p| Ok(vec![trix(g, p.close, TrixParams::default())?.trix]));
        assert_eq!(leading_nans(&t), 43);
        let s = eval_close(&closes, |g, p| Ok(vec![trix(g, p.close, TrixParams::default())?.signal]));
        assert_eq!(leading_nans(&s), 51);
    }

    #[test]
    fn flat_input_is_zero() {
        let t = eval_close(&[10.0; 20], |g, p| {
            Ok(vec![trix(
                g,
                p.close,
                TrixParams {
                    period: 3,
                    sigperiod: 2,
                },
            )?
            .trix])
        });
        assert_approx(t[19], 0.0, DEFAULT_EPSILON);
    }
}
