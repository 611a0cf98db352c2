//! Keltner Channel — EMA ± ATR multiplier.
//!
//! - mid: EMA(close, period)
//! - top: mid + devfactor · ATR(atr_period)
//! - bot: mid − devfactor · ATR(atr_period)
//!
//! Minperiod: `max(period, atr_period + 1)`.

use serde::{Deserialize, Serialize};

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::atr::atr;
use crate::indicators::basicops::combine;
use crate::indicators::ema::ema;
use crate::indicators::PriceLines;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct KeltnerParams {
    pub period: usize,
    pub devfactor: f64,
    pub atr_period: usize,
}

impl Default for KeltnerParams {
    fn default() -> Self {
        Self {
            period: 20,
            devfactor: 2.0,
            atr_period: 10,
        }
    }
}

impl KeltnerParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        check_period("keltner", self.period)?;
        check_period("keltner", self.atr_period)?;
        if !(self.devfactor.is_finite() && self.devfactor > 0.0) {
            return Err(IndicatorError::InvalidParameter {
                indicator: "keltner",
                name: "devfactor",
                reason: format!("must be positive, got {}", self.devfactor),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeltnerLines {
    pub mid: LineRef,
    pub top: LineRef,
    pub bot: LineRef,
}

pub fn keltner(g: &mut IndicatorGraph, p: PriceLines, params: KeltnerParams) -> Result<KeltnerLines, IndicatorError> {
    params.validate()?;
    let mid = ema(g, p.close, params.period)?;
    let range = atr(g, p, params.atr_period)?;
    let top = combine(g, mid, 1.0, range, params.devfactor)?;
    let bot = combine(g, mid, 1.0, range, -params.devfactor)?;
    Ok(KeltnerLines { mid, top, bot })
}
