//! Formula trait — the per-bar computation core shared by both run modes.
//!
//! A formula never sees the whole input history at once. At bar `i` it gets
//! an [`Inputs`] view whose lines end at `i`, so reading ahead is impossible
//! by construction. Stepped runs call `nextstart`/`next` as bars arrive; the
//! default batch path (`once`) calls exactly the same methods in a loop over
//! preloaded inputs, which makes the two modes agree bit-for-bit.

use crate::lines::LineView;

/// Input lines visible to a formula at one bar.
#[derive(Debug, Clone, Copy)]
pub struct Inputs<'a> {
    lines: &'a [&'a [f64]],
    end: usize,
}

impl<'a> Inputs<'a> {
    /// `end` is the number of samples visible (current bar index + 1).
    pub fn new(lines: &'a [&'a [f64]], end: usize) -> Self {
        Self { lines, end }
    }

    /// Input line `k`, truncated at the current bar.
    pub fn line(&self, k: usize) -> LineView<'a> {
        match self.lines.get(k) {
            Some(line) => LineView::new(&line[..self.end.min(line.len())]),
            None => LineView::new(&[]),
        }
    }

    /// Shorthand for `line(k).at(offset)`.
    pub fn at(&self, k: usize, offset: isize) -> f64 {
        self.line(k).at(offset)
    }

    /// Current value of input `k`.
    pub fn get(&self, k: usize) -> f64 {
        self.at(k, 0)
    }

    /// The trailing `n` samples of input `k`; empty when fewer exist.
    pub fn window(&self, k: usize, n: usize) -> &'a [f64] {
        self.line(k).window(n).unwrap_or(&[])
    }

    /// Index of the current bar.
    pub fn index(&self) -> usize {
        self.end.saturating_sub(1)
    }

    pub fn arity(&self) -> usize {
        self.lines.len()
    }
}

/// One indicator node's computation.
///
/// `lookback` is the number of bars the formula needs beyond its inputs'
/// own warm-up: a node's minperiod is `max(input minperiods) + lookback`.
/// The engine writes NaN until then, calls `nextstart` exactly once on the
/// first defined bar, and `next` on every bar after that.
pub trait Formula: Send {
    /// Human-readable label, e.g. `sma(30)`.
    fn name(&self) -> String;

    /// Output line names. Defaults to a single line.
    fn lines(&self) -> &'static [&'static str] {
        &["value"]
    }

    /// Number of input lines the formula expects.
    fn arity(&self) -> usize {
        1
    }

    fn lookback(&self) -> usize;

    /// Drop any recurrence state. Called at the start of every run.
    fn reset(&mut self) {}

    /// First defined bar. Seeds recurrences; defaults to `next`.
    fn nextstart(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        self.next(inputs, out);
    }

    /// Every later bar. `out` arrives pre-filled with NaN.
    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]);

    /// Compute every output sample from `first` to the end in one pass.
    ///
    /// `out[k]` is pre-filled with NaN and has the inputs' length. Overrides
    /// must produce exactly what looping `nextstart`/`next` would.
    fn once(&mut self, inputs: &[&[f64]], first: usize, out: &mut [Vec<f64>]) {
        let n = inputs.first().map_or(0, |line| line.len());
        let mut row = vec![f64::NAN; out.len()];
        for i in first..n {
            row.fill(f64::NAN);
            let view = Inputs::new(inputs, i + 1);
            if i == first {
                self.nextstart(&view, &mut row);
            } else {
                self.next(&view, &mut row);
            }
            for (line, value) in out.iter_mut().zip(&row) {
                line[i] = *value;
            }
        }
    }
}
