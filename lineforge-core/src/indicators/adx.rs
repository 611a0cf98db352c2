//! Directional movement: UpMove/DownMove, ±DI, DX, ADX and ADXR.
//!
//! ```text
//! upmove   = high − high(−1)          downmove = low(−1) − low
//! +DM      = upmove if upmove > downmove and upmove > 0, else 0
//! −DM      = downmove if downmove > upmove and downmove > 0, else 0
//! ±DI      = 100 · SMMA(±DM, p) / ATR(p)
//! DX       = 100 · |+DI − −DI| / (+DI + −DI)
//! ADX      = SMMA(DX, p)
//! ADXR     = (ADX + ADX(−p)) / 2
//! ```
//!
//! Default minperiods with p = 14: DI/DX 15, ADX 28, ADXR 42.

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::atr::atr;
use crate::indicators::basicops::{abs, add, affine, combine, delay, div, sub};
use crate::indicators::ema::smma;
use crate::indicators::formula::{Formula, Inputs};
use crate::indicators::PriceLines;

/// Inputs: upmove, downmove. Lines: plus_dm, minus_dm.
#[derive(Debug, Clone, Default)]
pub struct DirectionalMove;

impl Formula for DirectionalMove {
    fn name(&self) -> String {
        "dm".to_string()
    }

    fn lines(&self) -> &'static [&'static str] {
        &["plus_dm", "minus_dm"]
    }

    fn arity(&self) -> usize {
        2
    }

    fn lookback(&self) -> usize {
        0
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        let (up, down) = (inputs.get(0), inputs.get(1));
        if up.is_nan() || down.is_nan() {
            return;
        }
        out[0] = if up > down && up > 0.0 { up } else { 0.0 };
        out[1] = if down > up && down > 0.0 { down } else { 0.0 };
    }
}

/// `high − high(−1)`.
pub fn up_move(g: &mut IndicatorGraph, p: PriceLines) -> Result<LineRef, IndicatorError> {
    let prev = delay(g, p.high, 1)?;
    sub(g, p.high, prev)
}

/// `low(−1) − low`.
pub fn down_move(g: &mut IndicatorGraph, p: PriceLines) -> Result<LineRef, IndicatorError> {
    let prev = delay(g, p.low, 1)?;
    sub(g, prev, p.low)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiLines {
    pub plus_di: LineRef,
    pub minus_di: LineRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdxLines {
    pub plus_di: LineRef,
    pub minus_di: LineRef,
    pub dx: LineRef,
    pub adx: LineRef,
    pub adxr: LineRef,
}

pub fn directional_indicator(g: &mut IndicatorGraph, p: PriceLines, period: usize) -> Result<DiLines, IndicatorError> {
    check_period("di", period)?;
    let up = up_move(g, p)?;
    let down = down_move(g, p)?;
    let dm = g.add(DirectionalMove, &[up, down])?;
    let range = atr(g, p, period)?;
    let di = |g: &mut IndicatorGraph, line: LineRef| -> Result<LineRef, IndicatorError> {
        let smoothed = smma(g, line, period)?;
        let ratio = div(g, smoothed, range)?;
        affine(g, ratio, 100.0, 0.0)
    };
    let plus_di = di(g, dm.line(0))?;
    let minus_di = di(g, dm.line(1))?;
    Ok(DiLines { plus_di, minus_di })
}

pub fn dx(g: &mut IndicatorGraph, di: DiLines) -> Result<LineRef, IndicatorError> {
    let spread = sub(g, di.plus_di, di.minus_di)?;
    let spread = abs(g, spread)?;
    let total = add(g, di.plus_di, di.minus_di)?;
    let ratio = div(g, spread, total)?;
    affine(g, ratio, 100.0, 0.0)
}

/// The full directional-movement system.
pub fn adx(g: &mut IndicatorGraph, p: PriceLines, period: usize) -> Result<AdxLines, IndicatorError> {
    let di = directional_indicator(g, p, period)?;
    let dx_line = dx(g, di)?;
    let adx_line = smma(g, dx_line, period)?;
    let past = delay(g, adx_line, period)?;
    let adxr = combine(g, adx_line, 0.5, past, 0.5)?;
    Ok(AdxLines {
        plus_di: di.plus_di,
        minus_di: di.minus_di,
        dx: dx_line,
        adx: adx_line,
        adxr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, eval, leading_nans, make_bars, DEFAULT_EPSILON};

    #[test]
    fn default_minperiods() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + (i as f64 * 0.15).sin() * 10.0).collect();
        let lines = eval(make_bars(&closes), |g, p| {
            let a = adx(g, p, 14)?;
            Ok(vec![a.plus_di, a.dx, a.adx, a.adxr])
        });
        assert_eq!(leading_nans(&lines[0]), 14);
        assert_eq!(leading_nans(&lines[1]), 14);
        assert_eq!(leading_nans(&lines[2]), 27);
        assert_eq!(leading_nans(&lines[3]), 41);
        assert!(lines[2][27..].iter().all(|v| (0.0..=100.0).contains(v)));
    }

    #[test]
    fn steady_uptrend_has_no_minus_dm() {
        let closes: Vec<f64> = (0..40).map(f64::from).collect();
        let lines = eval(make_bars(&closes), |g, p| {
            let a = adx(g, p, 5)?;
            Ok(vec![a.plus_di, a.minus_di, a.dx])
        });
        // make_bars rising by 1: upmove 1, downmove -1, TR 3
        assert_approx(lines[0][39], 100.0 / 3.0, 1e-9);
        assert_approx(lines[1][39], 0.0, DEFAULT_EPSILON);
        assert_approx(lines[2][39], 100.0, 1e-9);
    }

    #[test]
    fn directional_move_rules() {
        let mut dm = DirectionalMove;
        let up = [2.0];
        let down = [1.0];
        let lines: [&[f64]; 2] = [&up, &down];
        let mut out = [f64::NAN; 2];
        dm.next(&Inputs::new(&lines, 1), &mut out);
        assert_eq!(out, [2.0, 0.0]);
    }
}
