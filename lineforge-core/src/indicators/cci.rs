//! Commodity Channel Index.
//!
//! `tp = (h + l + c) / 3`, `dev = tp − SMA(tp, p)`,
//! `meandev = SMA(|dev|, p)`, `CCI = dev / (factor · meandev)`.
//!
//! The mean deviation averages distances from each bar's own mean, so the
//! minperiod is `2p − 1` (39 by default).

use serde::{Deserialize, Serialize};

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::basicops::{abs, affine, div, sub};
use crate::indicators::movav::MovAv;
use crate::indicators::price::typical_price;
use crate::indicators::PriceLines;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CciParams {
    pub period: usize,
    pub factor: f64,
    pub movav: MovAv,
}

impl Default for CciParams {
    fn default() -> Self {
        Self {
            period: 20,
            factor: 0.015,
            movav: MovAv::Sma,
        }
    }
}

impl CciParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        check_period("cci", self.period)?;
        if !(self.factor.is_finite() && self.factor > 0.0) {
            return Err(IndicatorError::InvalidParameter {
                indicator: "cci",
                name: "factor",
                reason: format!("must be positive, got {}", self.factor),
            });
        }
        Ok(())
    }
}

pub fn cci(g: &mut IndicatorGraph, p: PriceLines, params: CciParams) -> Result<LineRef, IndicatorError> {
    params.validate()?;
    let tp = typical_price(g, p)?;
    let mean = params.movav.build(g, tp, params.period)?;
    let dev = sub(g, tp, mean)?;
    let absdev = abs(g, dev)?;
    let meandev = params.movav.build(g, absdev, params.period)?;
    let scaled = affine(g, meandev, params.factor, 0.0)?;
    div(g, dev, scaled)
}
