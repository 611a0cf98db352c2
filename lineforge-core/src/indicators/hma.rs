//! Hull Moving Average.
//!
//! `HMA(p) = WMA(2·WMA(x, p/2) − WMA(x, p), ⌊√p⌋)`, both sub-periods at least 1.

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::basicops::combine;
use crate::indicators::wma::wma;

pub fn hma(g: &mut IndicatorGraph, input: LineRef, period: usize) -> Result<LineRef, IndicatorError> {
    check_period("hma", period)?;
    let half = (period / 2).max(1);
    let sqrt = ((period as f64).sqrt() as usize).max(1);
    let fast = wma(g, input, half)?;
    let slow = wma(g, input, period)?;
    let raw = combine(g, fast, 2.0, slow, -1.0)?;
    wma(g, raw, sqrt)
}
