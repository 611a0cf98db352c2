//! Momentum and its ratio form.
//!
//! - `Momentum(p) = x − x(−p)`
//! - `MomentumOscillator(p) = 100 · x / x(−p)`
//!
//! Both need `p` bars of history: minperiod `p + 1`.

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::basicops::safe_div;
use crate::indicators::formula::{Formula, Inputs};

/// How the current sample is compared against the one `period` bars back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// `x − x(−p)`
    Difference,
    /// `100 · x / x(−p)`
    Oscillator,
    /// `(x − x(−p)) / x(−p)`
    Rate,
    /// `100 · (x − x(−p)) / x(−p)`
    Rate100,
    /// `x / x(−p) − 1`
    PctChange,
}

impl ChangeKind {
    fn label(self) -> &'static str {
        match self {
            ChangeKind::Difference => "momentum",
            ChangeKind::Oscillator => "momentum_osc",
            ChangeKind::Rate => "roc",
            ChangeKind::Rate100 => "roc100",
            ChangeKind::PctChange => "pct_change",
        }
    }

    fn apply(self, now: f64, then: f64) -> f64 {
        match self {
            ChangeKind::Difference => now - then,
            ChangeKind::Oscillator => 100.0 * safe_div(now, then),
            ChangeKind::Rate => safe_div(now - then, then),
            ChangeKind::Rate100 => 100.0 * safe_div(now - then, then),
            ChangeKind::PctChange => safe_div(now, then) - 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Change {
    kind: ChangeKind,
    period: usize,
}

impl Change {
    pub fn new(kind: ChangeKind, period: usize) -> Result<Self, IndicatorError> {
        check_period(kind.label(), period)?;
        Ok(Self { kind, period })
    }
}

impl Formula for Change {
    fn name(&self) -> String {
        format!("{}({})", self.kind.label(), self.period)
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        out[0] = self.kind.apply(inputs.get(0), inputs.at(0, -(self.period as isize)));
    }
}

pub(crate) fn change(
    g: &mut IndicatorGraph,
    kind: ChangeKind,
    input: LineRef,
    period: usize,
) -> Result<LineRef, IndicatorError> {
    Ok(g.add(Change::new(kind, period)?, &[input])?.out())
}

pub fn momentum(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    change(g, ChangeKind::Difference, input, period)
}

pub fn momentum_oscillator(
    g: &mut IndicatorGraph,
    input: LineRef,
    period: usize,
) -> Result<LineRef, IndicatorError> {
    change(g, ChangeKind::Oscillator, input, period)
}
