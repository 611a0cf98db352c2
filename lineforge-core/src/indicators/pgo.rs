//! Pretty Good Oscillator: `(close − MA(close, p)) / ATR(p)`.
//!
//! Minperiod `p + 1`, from the ATR.

use crate::engine::{IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::atr::atr;
use crate::indicators::basicops::{div, sub};
use crate::indicators::movav::MovAv;
use crate::indicators::PriceLines;

pub fn pgo(g: &mut IndicatorGraph, p: PriceLines, period: usize, movav: MovAv) -> Result<LineRef, IndicatorError> {
    let ma = movav.build(g, p.close, period)?;
    let dist = sub(g, p.close, ma)?;
    let range = atr(g, p, period)?;
    div(g, dist, range)
}
