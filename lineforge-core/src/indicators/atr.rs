//! True range family and the Average True Range.
//!
//! - TrueHigh: `max(high, close(−1))`
//! - TrueLow: `min(low, close(−1))`
//! - TrueRange: `TrueHigh − TrueLow`
//! - ATR(p): Wilder smoothing (α = 1/p) of TrueRange
//!
//! TrueRange needs the previous close: minperiod 2, ATR(14) 15.

use crate::engine::{IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::ema::smma;
use crate::indicators::formula::{Formula, Inputs};
use crate::indicators::PriceLines;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    TrueHigh,
    TrueLow,
    TrueRange,
}

/// Inputs: high, low, close.
#[derive(Debug, Clone)]
pub struct TrueRange {
    kind: RangeKind,
}

impl TrueRange {
    pub fn new(kind: RangeKind) -> Self {
        Self { kind }
    }
}

/// `(true_high, true_low)` for one bar given the previous close.
pub(crate) fn true_bounds(high: f64, low: f64, prev_close: f64) -> (f64, f64) {
    if prev_close.is_nan() {
        return (f64::NAN, f64::NAN);
    }
    (high.max(prev_close), low.min(prev_close))
}

impl Formula for TrueRange {
    fn name(&self) -> String {
        match self.kind {
            RangeKind::TrueHigh => "truehigh".to_string(),
            RangeKind::TrueLow => "truelow".to_string(),
            RangeKind::TrueRange => "tr".to_string(),
        }
    }

    fn arity(&self) -> usize {
        3
    }

    fn lookback(&self) -> usize {
        1
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        let (high, low) = (inputs.get(0), inputs.get(1));
        if high.is_nan() || low.is_nan() {
            return;
        }
        let (th, tl) = true_bounds(high, low, inputs.at(2, -1));
        out[0] = match self.kind {
            RangeKind::TrueHigh => th,
            RangeKind::TrueLow => tl,
            RangeKind::TrueRange => th - tl,
        };
    }
}

fn range_line(g: &mut IndicatorGraph, kind: RangeKind, p: PriceLines) -> Result<LineRef, IndicatorError> {
    Ok(g.add(TrueRange::new(kind), &[p.high, p.low, p.close])?.out())
}

pub fn true_high(g: &mut IndicatorGraph, p: PriceLines) -> Result<LineRef, IndicatorError> {
    range_line(g, RangeKind::TrueHigh, p)
}

pub fn true_low(g: &mut IndicatorGraph, p: PriceLines) -> Result<LineRef, IndicatorError> {
    range_line(g, RangeKind::TrueLow, p)
}

pub fn true_range(g: &mut IndicatorGraph, p: PriceLines) -> Result<LineRef, IndicatorError> {
    range_line(g, RangeKind::TrueRange, p)
}

pub fn atr(g: &mut IndicatorGraph, p: PriceLines, period: usize) -> Result<LineRef, IndicatorError> {
    let tr = true_range(g, p)?;
    smma(g, tr, period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use crate::indicators::{assert_approx, eval, leading_nans, make_bars, DEFAULT_EPSILON};

    fn bars() -> Vec<Bar> {
        let t = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        vec![
            Bar::new(t, 10.0, 12.0, 9.0, 11.0, 1.0),
            // Gap up: low 13 above prev close 11
            Bar::new(t + chrono::Duration::days(1), 13.0, 15.0, 13.0, 14.0, 1.0),
            // Inside bar
            Bar::new(t + chrono::Duration::days(2), 14.0, 14.5, 13.5, 14.0, 1.0),
        ]
    }

    #[test]
    fn true_range_uses_previous_close() {
        let out = eval(bars(), |g, p| Ok(vec![true_high(g, p)?, true_low(g, p)?, true_range(g, p)?]));
        assert!(out[2][0].is_nan());
        assert_eq!(out[0][1], 15.0);
        assert_eq!(out[1][1], 11.0);
        assert_eq!(out[2][1], 4.0);
        assert_eq!(out[2][2], 1.0);
    }

    #[test]
    fn atr_is_wilder_smoothed() {
        let out = eval(bars(), |g, p| Ok(vec![atr(g, p, 2)?]));
        assert_eq!(leading_nans(&out[0]), 2);
        // Seed is the mean of TR[1..=2]
        assert_approx(out[0][2], 2.5, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_default_warmup() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let out = eval(make_bars(&closes), |g, p| Ok(vec![atr(g, p, 14)?]));
        assert_eq!(leading_nans(&out[0]), 14);
        // make_bars ranges: |close - prev close| = 1 plus 1 either side
        assert_approx(out[0][29], 3.0, DEFAULT_EPSILON);
    }
}
