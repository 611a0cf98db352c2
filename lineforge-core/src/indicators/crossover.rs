//! Crossings of two lines.
//!
//! The comparison uses the last non-zero difference `a − b`, so touching
//! and then separating again still counts as one crossing.
//!
//! - up: 1 when `a > b` now and `a < b` at the last non-zero difference
//! - down: 1 when `a < b` now and `a > b` at the last non-zero difference
//! - crossover: `up − down`
//!
//! Minperiod: input minperiod + 1.

use crate::engine::{IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::formula::{Formula, Inputs};

/// Inputs: a, b. Lines: crossover, up, down.
#[derive(Debug, Clone)]
pub struct Cross {
    last_nonzero: f64,
}

impl Default for Cross {
    fn default() -> Self {
        Self { last_nonzero: f64::NAN }
    }
}

impl Cross {
    fn remember(&mut self, diff: f64) {
        if !diff.is_nan() && diff != 0.0 {
            self.last_nonzero = diff;
        }
    }
}

impl Formula for Cross {
    fn name(&self) -> String {
        "cross".to_string()
    }

    fn lines(&self) -> &'static [&'static str] {
        &["crossover", "up", "down"]
    }

    fn arity(&self) -> usize {
        2
    }

    fn lookback(&self) -> usize {
        1
    }

    fn reset(&mut self) {
        self.last_nonzero = f64::NAN;
    }

    /// Replays the visible history to find the last non-zero difference.
    fn nextstart(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        self.last_nonzero = f64::NAN;
        let a = inputs.line(0).as_slice();
        let b = inputs.line(1).as_slice();
        let seen = a.len().min(b.len()).saturating_sub(1);
        for i in 0..seen {
            self.remember(a[i] - b[i]);
        }
        self.next(inputs, out);
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        let diff = inputs.get(0) - inputs.get(1);
        if diff.is_nan() {
            return;
        }
        let up = if self.last_nonzero < 0.0 && diff > 0.0 { 1.0 } else { 0.0 };
        let down = if self.last_nonzero > 0.0 && diff < 0.0 { 1.0 } else { 0.0 };
        out[0] = up - down;
        out[1] = up;
        out[2] = down;
        self.remember(diff);
    }
}

fn cross_line(g: &mut IndicatorGraph, a: LineRef, b: LineRef, k: usize) -> Result<LineRef, IndicatorError> {
    Ok(g.add(Cross::default(), &[a, b])?.line(k))
}

/// +1 when `a` crosses above `b`, −1 when below, else 0.
pub fn cross_over(g: &mut IndicatorGraph, a: LineRef, b: LineRef) -> Result<LineRef, IndicatorError> {
    cross_line(g, a, b, 0)
}

pub fn cross_up(g: &mut IndicatorGraph, a: LineRef, b: LineRef) -> Result<LineRef, IndicatorError> {
    cross_line(g, a, b, 1)
}

pub fn cross_down(g: &mut IndicatorGraph, a: LineRef, b: LineRef) -> Result<LineRef, IndicatorError> {
    cross_line(g, a, b, 2)
}
