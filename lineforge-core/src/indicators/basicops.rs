//! Building blocks: window statistics, elementwise operators, delays.
//!
//! Window formulas read the trailing `period` samples of one input and yield
//! NaN if any of them is NaN. Elementwise formulas have no lookback.

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::formula::{Formula, Inputs};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOp {
    Sum,
    Mean,
    Highest,
    Lowest,
    /// Population standard deviation.
    StdDev,
    /// Mean absolute deviation from the window mean.
    MeanDev,
}

impl WindowOp {
    fn label(self) -> &'static str {
        match self {
            WindowOp::Sum => "sum",
            WindowOp::Mean => "mean",
            WindowOp::Highest => "highest",
            WindowOp::Lowest => "lowest",
            WindowOp::StdDev => "stddev",
            WindowOp::MeanDev => "meandev",
        }
    }

    fn apply(self, window: &[f64]) -> f64 {
        if window.is_empty() || window.iter().any(|v| v.is_nan()) {
            return f64::NAN;
        }
        let n = window.len() as f64;
        match self {
            WindowOp::Sum => window.iter().sum(),
            WindowOp::Mean => window.iter().sum::<f64>() / n,
            WindowOp::Highest => window.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            WindowOp::Lowest => window.iter().copied().fold(f64::INFINITY, f64::min),
            WindowOp::StdDev => {
                let mean = window.iter().sum::<f64>() / n;
                let var = window.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
                var.sqrt()
            }
            WindowOp::MeanDev => {
                let mean = window.iter().sum::<f64>() / n;
                window.iter().map(|v| (v - mean).abs()).sum::<f64>() / n
            }
        }
    }
}

/// A statistic over the trailing `period` samples.
#[derive(Debug, Clone)]
pub struct Window {
    op: WindowOp,
    period: usize,
}

impl Window {
    pub fn new(op: WindowOp, period: usize) -> Result<Self, IndicatorError> {
        check_period(op.label(), period)?;
        Ok(Self { op, period })
    }
}

impl Formula for Window {
    fn name(&self) -> String {
        format!("{}({})", self.op.label(), self.period)
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        out[0] = self.op.apply(inputs.window(0, self.period));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// NaN when the divisor is zero.
    Div,
    Max,
    Min,
}

impl BinaryOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => safe_div(a, b),
            BinaryOp::Max => {
                if a.is_nan() || b.is_nan() {
                    f64::NAN
                } else {
                    a.max(b)
                }
            }
            BinaryOp::Min => {
                if a.is_nan() || b.is_nan() {
                    f64::NAN
                } else {
                    a.min(b)
                }
            }
        }
    }
}

/// `a / b`, NaN when `b` is zero.
pub fn safe_div(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        f64::NAN
    } else {
        a / b
    }
}

/// Elementwise operator over two lines.
#[derive(Debug, Clone)]
pub struct Binary {
    op: BinaryOp,
}

impl Binary {
    pub fn new(op: BinaryOp) -> Self {
        Self { op }
    }
}

impl Formula for Binary {
    fn name(&self) -> String {
        format!("{:?}", self.op).to_lowercase()
    }

    fn arity(&self) -> usize {
        2
    }

    fn lookback(&self) -> usize {
        0
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        out[0] = self.op.apply(inputs.get(0), inputs.get(1));
    }

    fn once(&mut self, inputs: &[&[f64]], first: usize, out: &mut [Vec<f64>]) {
        let (a, b) = (inputs[0], inputs[1]);
        for i in first..a.len().min(b.len()) {
            out[0][i] = self.op.apply(a[i], b[i]);
        }
    }
}

/// `ka·a + kb·b`.
#[derive(Debug, Clone)]
pub struct Combine {
    ka: f64,
    kb: f64,
}

impl Combine {
    pub fn new(ka: f64, kb: f64) -> Self {
        Self { ka, kb }
    }
}

impl Formula for Combine {
    fn name(&self) -> String {
        format!("combine({}, {})", self.ka, self.kb)
    }

    fn arity(&self) -> usize {
        2
    }

    fn lookback(&self) -> usize {
        0
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        out[0] = self.ka * inputs.get(0) + self.kb * inputs.get(1);
    }

    fn once(&mut self, inputs: &[&[f64]], first: usize, out: &mut [Vec<f64>]) {
        let (a, b) = (inputs[0], inputs[1]);
        for i in first..a.len().min(b.len()) {
            out[0][i] = self.ka * a[i] + self.kb * b[i];
        }
    }
}

/// `scale·x + offset`.
#[derive(Debug, Clone)]
pub struct Affine {
    scale: f64,
    offset: f64,
}

impl Affine {
    pub fn new(scale: f64, offset: f64) -> Self {
        Self { scale, offset }
    }
}

impl Formula for Affine {
    fn name(&self) -> String {
        format!("affine({}, {})", self.scale, self.offset)
    }

    fn lookback(&self) -> usize {
        0
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        out[0] = self.scale * inputs.get(0) + self.offset;
    }

    fn once(&mut self, inputs: &[&[f64]], first: usize, out: &mut [Vec<f64>]) {
        for (i, x) in inputs[0].iter().enumerate().skip(first) {
            out[0][i] = self.scale * x + self.offset;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Abs;

impl Formula for Abs {
    fn name(&self) -> String {
        "abs".into()
    }

    fn lookback(&self) -> usize {
        0
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        out[0] = inputs.get(0).abs();
    }

    fn once(&mut self, inputs: &[&[f64]], first: usize, out: &mut [Vec<f64>]) {
        for (i, x) in inputs[0].iter().enumerate().skip(first) {
            out[0][i] = x.abs();
        }
    }
}

/// The input `lag` bars ago.
#[derive(Debug, Clone)]
pub struct Delay {
    lag: usize,
}

impl Delay {
    pub fn new(lag: usize) -> Self {
        Self { lag }
    }
}

impl Formula for Delay {
    fn name(&self) -> String {
        format!("delay({})", self.lag)
    }

    fn lookback(&self) -> usize {
        self.lag
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        out[0] = inputs.at(0, -(self.lag as isize));
    }
}

fn window(g: &mut IndicatorGraph, op: WindowOp, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    Ok(g.add(Window::new(op, period)?, &[input])?.out())
}

pub fn sum_n(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    window(g, WindowOp::Sum, input, period)
}

pub fn highest(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    window(g, WindowOp::Highest, input, period)
}

pub fn lowest(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    window(g, WindowOp::Lowest, input, period)
}

pub fn stddev(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    window(g, WindowOp::StdDev, input, period)
}

pub fn mean_dev(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    window(g, WindowOp::MeanDev, input, period)
}

pub fn binary(g: &mut IndicatorGraph, op: BinaryOp, a: LineRef, b: LineRef) -> Result<LineRef, IndicatorError> {
    Ok(g.add(Binary::new(op), &[a, b])?.out())
}

pub fn add(g: &mut IndicatorGraph, a: LineRef, b: LineRef) -> Result<LineRef, IndicatorError> {
    binary(g, BinaryOp::Add, a, b)
}

pub fn sub(g: &mut IndicatorGraph, a: LineRef, b: LineRef) -> Result<LineRef, IndicatorError> {
    binary(g, BinaryOp::Sub, a, b)
}

pub fn mul(g: &mut IndicatorGraph, a: LineRef, b: LineRef) -> Result<LineRef, IndicatorError> {
    binary(g, BinaryOp::Mul, a, b)
}

pub fn div(g: &mut IndicatorGraph, a: LineRef, b: LineRef) -> Result<LineRef, IndicatorError> {
    binary(g, BinaryOp::Div, a, b)
}

pub fn max_of(g: &mut IndicatorGraph, a: LineRef, b: LineRef) -> Result<LineRef, IndicatorError> {
    binary(g, BinaryOp::Max, a, b)
}

pub fn min_of(g: &mut IndicatorGraph, a: LineRef, b: LineRef) -> Result<LineRef, IndicatorError> {
    binary(g, BinaryOp::Min, a, b)
}

pub fn combine(g: &mut IndicatorGraph, a: LineRef, ka: f64, b: LineRef, kb: f64) -> Result<LineRef, IndicatorError> {
    Ok(g.add(Combine::new(ka, kb), &[a, b])?.out())
}

pub fn affine(g: &mut IndicatorGraph, input: LineRef, scale: f64, offset: f64) -> Result<LineRef, IndicatorError> {
    Ok(g.add(Affine::new(scale, offset), &[input])?.out())
}

pub fn abs(g: &mut IndicatorGraph, input: LineRef) -> Result<LineRef, IndicatorError> {
    Ok(g.add(Abs, &[input])?.out())
}

pub fn delay(g: &mut IndicatorGraph, input: LineRef, lag: usize) -> Result<LineRef, IndicatorError> {
    Ok(g.add(Delay::new(lag), &[input])?.out())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, eval_close, leading_nans, DEFAULT_EPSILON};

    #[test]
    fn window_stats() {
        let closes = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let sd = eval_close(&closes, |g, p| Ok(vec![stddev(g, p.close, 8)?]));
        assert_eq!(leading_nans(&sd), 7);
        assert_approx(sd[7], 2.0, DEFAULT_EPSILON);

        let hi = eval_close(&closes, |g, p| Ok(vec![highest(g, p.close, 3)?]));
        assert_eq!(hi[2..], [4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let lo = eval_close(&closes, |g, p| Ok(vec![lowest(g, p.close, 3)?]));
        assert_eq!(lo[2], 2.0);
        let s = eval_close(&closes, |g, p| Ok(vec![sum_n(g, p.close, 2)?]));
        assert_eq!(s[1], 6.0);
        let md = eval_close(&[1.0, 2.0, 3.0], |g, p| Ok(vec![mean_dev(g, p.close, 3)?]));
        assert_approx(md[2], 2.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn nan_in_window_is_nan() {
        assert!(WindowOp::Mean.apply(&[1.0, f64::NAN]).is_nan());
        assert!(WindowOp::Highest.apply(&[]).is_nan());
    }

    #[test]
    fn zero_period_rejected() {
        assert_eq!(
            Window::new(WindowOp::Sum, 0).unwrap_err(),
            IndicatorError::InvalidPeriod {
                indicator: "sum",
                period: 0
            }
        );
    }

    #[test]
    fn elementwise_ops() {
        let closes = [1.0, -2.0, 3.0];
        let d = eval_close(&closes, |g, p| Ok(vec![div(g, p.close, p.open)?]));
        // open = [1, 1, -2]
        assert_eq!(d, vec![1.0, -2.0, -1.5]);
        let z = eval_close(&[0.0, 1.0], |g, p| Ok(vec![div(g, p.close, p.open)?]));
        assert!(z[0].is_nan());
        let a = eval_close(&closes, |g, p| Ok(vec![abs(g, p.close)?]));
        assert_eq!(a, vec![1.0, 2.0, 3.0]);
        let c = eval_close(&closes, |g, p| Ok(vec![combine(g, p.close, 2.0, p.open, -1.0)?]));
        assert_eq!(c, vec![1.0, -5.0, 8.0]);
        let m = eval_close(&closes, |g, p| Ok(vec![max_of(g, p.close, p.open)?]));
        assert_eq!(m, vec![1.0, 1.0, 3.0]);
        let f = eval_close(&closes, |g, p| Ok(vec![affine(g, p.close, 10.0, 1.0)?]));
        assert_eq!(f, vec![11.0, -19.0, 31.0]);
    }

    #[test]
    fn delay_shifts_and_pads() {
        let d = eval_close(&[1.0, 2.0, 3.0, 4.0], |g, p| Ok(vec![delay(g, p.close, 2)?]));
        assert_eq!(leading_nans(&d), 2);
        assert_eq!(d[2..], [1.0, 2.0]);
    }
}
