//! MACD and price oscillators.
//!
//! - MACD: `macd = EMA(fast) − EMA(slow)`, `signal = EMA(macd, signal)`,
//!   `histo = macd − signal`. Minperiod `slow + signal − 1` (34 by default).
//! - APO: `MA(fast) − MA(slow)`. Minperiod `slow`.
//! - PPO: `100 · (MA(fast) − MA(slow)) / MA(slow)` with the same signal and
//!   histogram lines as MACD.

use serde::{Deserialize, Serialize};

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::basicops::{affine, div, sub};
use crate::indicators::ema::ema;
use crate::indicators::movav::MovAv;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    pub movav: MovAv,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
            movav: MovAv::Ema,
        }
    }
}

impl MacdParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        check_period("macd", self.fast)?;
        check_period("macd", self.slow)?;
        check_period("macd", self.signal)?;
        if self.fast >= self.slow {
            return Err(IndicatorError::InvalidParameter {
                indicator: "macd",
                name: "fast",
                reason: format!("fast period {} must be shorter than slow {}", self.fast, self.slow),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdLines {
    pub macd: LineRef,
    pub signal: LineRef,
    pub histo: LineRef,
}

fn with_signal(g: &mut IndicatorGraph, line: LineRef, signal: usize) -> Result<MacdLines, IndicatorError> {
    let sig = ema(g, line, signal)?;
    let histo = sub(g, line, sig)?;
    Ok(MacdLines {
        macd: line,
        signal: sig,
        histo,
    })
}

pub fn macd(g: &mut IndicatorGraph, input: LineRef, params: MacdParams) -> Result<MacdLines, IndicatorError> {
    let line = apo(g, input, params)?;
    with_signal(g, line, params.signal)
}

/// Absolute price oscillator: `MA(fast) − MA(slow)`.
pub fn apo(g: &mut IndicatorGraph, input: LineRef, params: MacdParams) -> Result<LineRef, IndicatorError> {
    params.validate()?;
    let fast = params.movav.build(g, input, params.fast)?;
    let slow = params.movav.build(g, input, params.slow)?;
    sub(g, fast, slow)
}

/// Percentage price oscillator. `macd` holds the PPO line.
pub fn ppo(g: &mut IndicatorGraph, input: LineRef, params: MacdParams) -> Result<MacdLines, IndicatorError> {
    params.validate()?;
    let fast = params.movav.build(g, input, params.fast)?;
    let slow = params.movav.build(g, input, params.slow)?;
    let diff = sub(g, fast, slow)?;
    let ratio = div(g, diff, slow)?;
    let line = affine(g, ratio, 100.0, 0.0)?;
    with_signal(g, line, params.signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, eval, leading_nans, make_bars, DEFAULT_EPSILON};

    fn wave(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + (i as f64 * 0.2).sin() * 10.0).collect()
    }

    #[test]
    fn macd_default_warmup() {
        let lines = eval(make_bars(&wave(60)), |g, p| {
            let m = macd(g, p.close, MacdParams::default())?;
            Ok(vec![m.macd, m.signal, m.histo])
        });
        assert_eq!(leading_nans(&lines[0]), 25);
        assert_eq!(leading_nans(&lines[1]), 33);
        assert_eq!(leading_nans(&lines[2]), 33);
        for i in 33..60 {
            assert_approx(lines[2][i], lines[0][i] - lines[1][i], DEFAULT_EPSILON);
        }
    }

    #[test]
    fn flat_input_is_zero() {
        let lines = eval(make_bars(&[50.0; 40]), |g, p| {
            let m = ppo(g, p.close, MacdParams::default())?;
            Ok(vec![m.macd, apo(g, p.close, MacdParams::default())?])
        });
        assert_approx(lines[0][39], 0.0, DEFAULT_EPSILON);
        assert_approx(lines[1][39], 0.0, DEFAULT_EPSILON);
        assert_eq!(leading_nans(&lines[1]), 25);
    }

    #[test]
    fn fast_must_be_shorter() {
        let p = MacdParams {
            fast: 26,
            slow: 12,
            ..MacdParams::default()
        };
        assert!(p.validate().is_err());
    }
}
