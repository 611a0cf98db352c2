//! Data series — the bundle of parallel lines a bar feed advances in lockstep.
//!
//! A series is built from an in-memory `Vec<Bar>`; loading from files or
//! services happens outside this crate. Lines start empty and grow one bar
//! per `advance()` (stepped runs) or all at once via `preload()` (batch runs).

pub mod synthetic;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Bar, BarPrices};
use crate::lines::{LineBuffer, LineView};

/// Errors from building or advancing a data series.
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("series '{name}': bar {index} is not strictly after the previous bar")]
    NonMonotonicTime { name: String, index: usize },

    #[error("series '{name}': {line} has {actual} samples, expected {expected}")]
    LengthMismatch {
        name: String,
        line: Field,
        actual: usize,
        expected: usize,
    },
}

/// The lines every data series carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    DateTime,
    Open,
    High,
    Low,
    Close,
    Volume,
    OpenInterest,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::DateTime,
        Field::Open,
        Field::High,
        Field::Low,
        Field::Close,
        Field::Volume,
        Field::OpenInterest,
    ];

    fn index(self) -> usize {
        match self {
            Field::DateTime => 0,
            Field::Open => 1,
            Field::High => 2,
            Field::Low => 3,
            Field::Close => 4,
            Field::Volume => 5,
            Field::OpenInterest => 6,
        }
    }

    fn extract(self, bar: &Bar) -> f64 {
        match self {
            Field::DateTime => bar.timestamp(),
            Field::Open => bar.open,
            Field::High => bar.high,
            Field::Low => bar.low,
            Field::Close => bar.close,
            Field::Volume => bar.volume,
            Field::OpenInterest => bar.open_interest,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Field::DateTime => "datetime",
            Field::Open => "open",
            Field::High => "high",
            Field::Low => "low",
            Field::Close => "close",
            Field::Volume => "volume",
            Field::OpenInterest => "openinterest",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct DataSeries {
    name: String,
    bars: Vec<Bar>,
    lines: [LineBuffer; 7],
}

impl DataSeries {
    /// Build a series from bars in strictly increasing time order.
    pub fn new(name: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        let name = name.into();
        if let Some(index) = bars
            .windows(2)
            .position(|w| w[1].datetime <= w[0].datetime)
        {
            return Err(SeriesError::NonMonotonicTime {
                name,
                index: index + 1,
            });
        }
        let capacity = bars.len();
        Ok(Self {
            name,
            bars,
            lines: std::array::from_fn(|_| LineBuffer::with_capacity(capacity)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bars loaded into the series (not necessarily advanced yet).
    pub fn total_len(&self) -> usize {
        self.bars.len()
    }

    /// Bars advanced so far.
    pub fn len(&self) -> usize {
        self.lines[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn line(&self, field: Field) -> &LineBuffer {
        &self.lines[field.index()]
    }

    /// View of `field` with `bar` as the current sample.
    pub fn view_at(&self, field: Field, bar: usize) -> LineView<'_> {
        self.line(field).view_at(bar)
    }

    /// Append the next bar to every line. Returns `false` once exhausted.
    pub fn advance(&mut self) -> bool {
        let next = self.len();
        let Some(bar) = self.bars.get(next) else {
            return false;
        };
        for field in Field::ALL {
            self.lines[field.index()].append(field.extract(bar));
        }
        true
    }

    /// Append every remaining bar.
    pub fn preload(&mut self) {
        while self.advance() {}
    }

    /// Verify every line has the same length.
    pub fn check_lockstep(&self) -> Result<(), SeriesError> {
        let expected = self.lines[0].len();
        for field in Field::ALL {
            let actual = self.line(field).len();
            if actual != expected {
                return Err(SeriesError::LengthMismatch {
                    name: self.name.clone(),
                    line: field,
                    actual,
                    expected,
                });
            }
        }
        Ok(())
    }

    /// Prices of an already-advanced bar, read back from the lines.
    pub fn prices_at(&self, bar: usize) -> Option<BarPrices> {
        if bar >= self.len() {
            return None;
        }
        Some(BarPrices {
            open: self.line(Field::Open).get(bar),
            high: self.line(Field::High).get(bar),
            low: self.line(Field::Low).get(bar),
            close: self.line(Field::Close).get(bar),
            volume: self.line(Field::Volume).get(bar),
        })
    }

    /// Clear all lines. Only called when a new run starts.
    pub fn reset(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
    }

    #[cfg(test)]
    pub(crate) fn line_mut_for_test(&mut self, field: Field) -> &mut LineBuffer {
        &mut self.lines[field.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn advance_appends_in_lockstep() {
        let mut series = DataSeries::new("t", make_bars(&[1.0, 2.0, 3.0])).unwrap();
        assert!(series.is_empty());
        assert!(series.advance());
        assert!(series.advance());
        assert_eq!(series.len(), 2);
        assert_eq!(series.line(Field::Close).at(0), 2.0);
        assert_eq!(series.line(Field::Close).at(-1), 1.0);
        assert!(series.check_lockstep().is_ok());
    }

    #[test]
    fn advance_stops_when_exhausted() {
        let mut series = DataSeries::new("t", make_bars(&[1.0])).unwrap();
        assert!(series.advance());
        assert!(!series.advance());
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn preload_appends_everything() {
        let mut series = DataSeries::new("t", make_bars(&[1.0, 2.0, 3.0, 4.0])).unwrap();
        series.preload();
        assert_eq!(series.len(), 4);
        assert_eq!(series.prices_at(3).unwrap().close, 4.0);
        assert!(series.prices_at(4).is_none());
    }

    #[test]
    fn rejects_non_increasing_time() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0]);
        bars[2].datetime = bars[1].datetime;
        let err = DataSeries::new("dup", bars).unwrap_err();
        assert_eq!(
            err,
            SeriesError::NonMonotonicTime {
                name: "dup".into(),
                index: 2
            }
        );
    }

    #[test]
    fn lockstep_violation_detected() {
        let mut series = DataSeries::new("t", make_bars(&[1.0, 2.0])).unwrap();
        series.advance();
        series.line_mut_for_test(Field::Volume).append(5.0);
        assert!(matches!(
            series.check_lockstep(),
            Err(SeriesError::LengthMismatch { line: Field::Volume, .. })
        ));
    }

    #[test]
    fn reset_clears_lines_but_keeps_bars() {
        let mut series = DataSeries::new("t", make_bars(&[1.0, 2.0])).unwrap();
        series.preload();
        series.reset();
        assert_eq!(series.len(), 0);
        assert_eq!(series.total_len(), 2);
    }
}
