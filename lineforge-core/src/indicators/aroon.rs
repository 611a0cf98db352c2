//! Aroon up/down and the Aroon oscillator.
//!
//! Over a `period + 1` bar window:
//! `up = 100 · (period − bars since highest high) / period`, and
//! `down` likewise with the lowest low. The most recent extreme wins ties.
//! Minperiod `period + 1`.

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::basicops::sub;
use crate::indicators::formula::{Formula, Inputs};
use crate::indicators::PriceLines;

/// Inputs: high, low. Lines: up, down.
#[derive(Debug, Clone)]
pub struct Aroon {
    period: usize,
}

impl Aroon {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        check_period("aroon", period)?;
        Ok(Self { period })
    }

    fn score(&self, window: &[f64], pick: impl Fn(f64, f64) -> bool) -> f64 {
        if window.iter().any(|v| v.is_nan()) {
            return f64::NAN;
        }
        let mut best = 0;
        for (i, &v) in window.iter().enumerate() {
            if pick(v, window[best]) || v == window[best] {
                best = i;
            }
        }
        let since = window.len() - 1 - best;
        100.0 * (self.period - since) as f64 / self.period as f64
    }
}

impl Formula for Aroon {
    fn name(&self) -> String {
        format!("aroon({})", self.period)
    }

    fn lines(&self) -> &'static [&'static str] {
        &["up", "down"]
    }

    fn arity(&self) -> usize {
        2
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        let n = self.period + 1;
        let highs = inputs.window(0, n);
        let lows = inputs.window(1, n);
        if highs.is_empty() || lows.is_empty() {
            return;
        }
        out[0] = self.score(highs, |v, best| v > best);
        out[1] = self.score(lows, |v, best| v < best);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AroonLines {
    pub up: LineRef,
    pub down: LineRef,
}

pub fn aroon(g: &mut IndicatorGraph, p: PriceLines, period: usize) -> Result<AroonLines, IndicatorError> {
    let node = g.add(Aroon::new(period)?, &[p.high, p.low])?;
    Ok(AroonLines {
        up: node.line(0),
        down: node.line(1),
    })
}

/// `up − down`.
pub fn aroon_oscillator(g: &mut IndicatorGraph, p: PriceLines, period: usize) -> Result<LineRef, IndicatorError> {
    let lines = aroon(g, p, period)?;
    sub(g, lines.up, lines.down)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{eval, leading_nans, make_bars};

    #[test]
    fn rising_market_reads_full_up() {
        let closes: Vec<f64> = (0..20).map(f64::from).collect();
        let lines = eval(make_bars(&closes), |g, p| {
            let a = aroon(g, p, 14)?;
            Ok(vec![a.up, a.down, aroon_oscillator(g, p, 14)?])
        });
        assert_eq!(leading_nans(&lines[0]), 14);
        assert_eq!(lines[0][19], 100.0);
        // Lowest low is the oldest bar of the window
        assert_eq!(lines[1][19], 0.0);
        assert_eq!(lines[2][19], 100.0);
    }

    #[test]
    fn ties_prefer_most_recent() {
        let lines = eval(make_bars(&[5.0; 6]), |g, p| Ok(vec![aroon(g, p, 4)?.up]));
        assert_eq!(lines[0][5], 100.0);
    }
}
