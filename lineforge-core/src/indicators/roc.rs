//! Rate of change: `ROC`, `ROC100` and `PctChange`.
//!
//! Thin builders over [`Change`](crate::indicators::momentum::Change).
//! Minperiod `p + 1`.

use crate::engine::{IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::momentum::{change, ChangeKind};

/// `(x − x(−p)) / x(−p)`
pub fn roc(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    change(g, ChangeKind::Rate, input, period)
}

/// `100 · (x − x(−p)) / x(−p)`
pub fn roc100(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    change(g, ChangeKind::Rate100, input, period)
}

/// `x / x(−p) − 1`
pub fn pct_change(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    change(g, ChangeKind::PctChange, input, period)
}
