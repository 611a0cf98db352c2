//! Ichimoku Kinko Hyo.
//!
//! ```text
//! tenkan   = (HH(tenkan) + LL(tenkan)) / 2
//! kijun    = (HH(kijun) + LL(kijun)) / 2
//! senkou_a = ((tenkan + kijun) / 2)(−senkou_lead)
//! senkou_b = ((HH(senkou) + LL(senkou)) / 2)(−senkou_lead)
//! ```
//!
//! The senkou spans are plotted `senkou_lead` bars ahead, which at bar `t`
//! means reading the value computed `senkou_lead` bars ago. The chikou span
//! would need future closes and is not produced. Minperiod of senkou B:
//! `senkou + senkou_lead` (78 by default).

use serde::{Deserialize, Serialize};

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::basicops::{combine, delay, highest, lowest};
use crate::indicators::PriceLines;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct IchimokuParams {
    pub tenkan: usize,
    pub kijun: usize,
    pub senkou: usize,
    pub senkou_lead: usize,
}

impl Default for IchimokuParams {
    fn default() -> Self {
        Self {
            tenkan: 9,
            kijun: 26,
            senkou: 52,
            senkou_lead: 26,
        }
    }
}

impl IchimokuParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        check_period("ichimoku", self.tenkan)?;
        check_period("ichimoku", self.kijun)?;
        check_period("ichimoku", self.senkou)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IchimokuLines {
    pub tenkan_sen: LineRef,
    pub kijun_sen: LineRef,
    pub senkou_span_a: LineRef,
    pub senkou_span_b: LineRef,
}

fn midpoint(g: &mut IndicatorGraph, p: PriceLines, period: usize) -> Result<LineRef, IndicatorError> {
    let hh = highest(g, p.high, period)?;
    let ll = lowest(g, p.low, period)?;
    combine(g, hh, 0.5, ll, 0.5)
}

pub fn ichimoku(g: &mut IndicatorGraph, p: PriceLines, params: IchimokuParams) -> Result<IchimokuLines, IndicatorError> {
    params.validate()?;
    let tenkan_sen = midpoint(g, p, params.tenkan)?;
    let kijun_sen = midpoint(g, p, params.kijun)?;
    let mid = combine(g, tenkan_sen, 0.5, kijun_sen, 0.5)?;
    let senkou_span_a = delay(g, mid, params.senkou_lead)?;
    let span_b = midpoint(g, p, params.senkou)?;
    let senkou_span_b = delay(g, span_b, params.senkou_lead)?;
    Ok(IchimokuLines {
        tenkan_sen,
        kijun_sen,
        senkou_span_a,
        senkou_span_b,
    })
}
