//! Detrended Price Oscillator.
//!
//! `dpo = x − MA(x, p)(−lag)` with `lag = p/2 − 1`: the price compared with
//! an average centred behind it. Minperiod `p + lag` (29 for p = 20).

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::basicops::{delay, sub};
use crate::indicators::movav::MovAv;

pub fn dpo(g: &mut IndicatorGraph, input: LineRef, period: usize, movav: MovAv) -> Result<LineRef, IndicatorError> {
    check_period("dpo", period)?;
    let lag = (period / 2).saturating_sub(1);
    let ma = movav.build(g, input, period)?;
    let shifted = delay(g, ma, lag)?;
    sub(g, input, shifted)
}
