//! Line buffers — append-only numeric sequences with "current bar" addressing.
//!
//! Offset 0 is the most recently appended sample, -1 the one before it, and so
//! on. Any read outside the stored range (including positive offsets, which
//! would address the future) yields NaN instead of panicking.

/// An append-only sequence of samples owned by exactly one producer
/// (a data series or an indicator node).
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    values: Vec<f64>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Append one sample. Length only ever grows during a run.
    pub fn append(&mut self, value: f64) {
        self.values.push(value);
    }

    /// Sample `offset` bars behind the head (0 = newest). NaN when out of range.
    pub fn at(&self, offset: isize) -> f64 {
        self.view().at(offset)
    }

    /// Absolute addressing from the first sample. NaN when out of range.
    pub fn get(&self, index: usize) -> f64 {
        self.values.get(index).copied().unwrap_or(f64::NAN)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// The trailing `n` samples, or `None` if fewer than `n` exist.
    pub fn window(&self, n: usize) -> Option<&[f64]> {
        self.view().window(n)
    }

    /// Read-only view of everything appended so far.
    pub fn view(&self) -> LineView<'_> {
        LineView::new(&self.values)
    }

    /// Read-only view truncated so that `bar` is the current sample.
    ///
    /// Samples after `bar` are unaddressable through the returned view.
    pub fn view_at(&self, bar: usize) -> LineView<'_> {
        let end = (bar + 1).min(self.values.len());
        LineView::new(&self.values[..end])
    }

    /// Clear all samples. Only called when a new run starts.
    pub fn reset(&mut self) {
        self.values.clear();
    }

    /// Swap in a fully computed buffer (batch evaluation).
    pub(crate) fn replace(&mut self, values: Vec<f64>) {
        self.values = values;
    }
}

impl From<Vec<f64>> for LineBuffer {
    fn from(values: Vec<f64>) -> Self {
        Self { values }
    }
}

/// Borrowed, read-only window onto a line, ending at the current bar.
#[derive(Debug, Clone, Copy)]
pub struct LineView<'a> {
    values: &'a [f64],
}

impl<'a> LineView<'a> {
    pub fn new(values: &'a [f64]) -> Self {
        Self { values }
    }

    /// Sample `offset` bars behind the current one (0 = current, -1 = previous).
    pub fn at(&self, offset: isize) -> f64 {
        if offset > 0 {
            return f64::NAN;
        }
        let back = offset.unsigned_abs();
        if back >= self.values.len() {
            return f64::NAN;
        }
        self.values[self.values.len() - 1 - back]
    }

    /// Shorthand for `at(0)`.
    pub fn current(&self) -> f64 {
        self.at(0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &'a [f64] {
        self.values
    }

    /// The trailing `n` samples ending at the current one.
    pub fn window(&self, n: usize) -> Option<&'a [f64]> {
        if n > self.values.len() {
            return None;
        }
        Some(&self.values[self.values.len() - n..])
    }
}
