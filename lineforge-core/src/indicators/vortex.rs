//! Vortex indicator.
//!
//! `VM+ = |high − low(−1)|`, `VM− = |low − high(−1)|`,
//! `VI± = ΣVM±(p) / ΣTR(p)`. Minperiod `p + 1`.

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::atr::true_range;
use crate::indicators::basicops::{abs, delay, div, sub, sum_n};
use crate::indicators::PriceLines;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VortexLines {
    pub vi_plus: LineRef,
    pub vi_minus: LineRef,
}

pub fn vortex(g: &mut IndicatorGraph, p: PriceLines, period: usize) -> Result<VortexLines, IndicatorError> {
    check_period("vortex", period)?;
    let prev_low = delay(g, p.low, 1)?;
    let prev_high = delay(g, p.high, 1)?;
    let vm_plus = sub(g, p.high, prev_low)?;
    let vm_plus = abs(g, vm_plus)?;
    let vm_minus = sub(g, p.low, prev_high)?;
    let vm_minus = abs(g, vm_minus)?;
    let tr = true_range(g, p)?;
    let tr_sum = sum_n(g, tr, period)?;
    let plus_sum = sum_n(g, vm_plus, period)?;
    let minus_sum = sum_n(g, vm_minus, period)?;
    Ok(VortexLines {
        vi_plus: div(g, plus_sum, tr_sum)?,
        vi_minus: div(g, minus_sum, tr_sum)?,
    })
}
