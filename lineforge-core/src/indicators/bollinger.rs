//! Bollinger Bands — moving average ± multiple of the standard deviation.
//!
//! - mid: SMA(x, period)
//! - top: mid + devfactor · stddev(x, period)
//! - bot: mid − devfactor · stddev(x, period)
//! - %B: (x − bot) / (top − bot)
//!
//! Uses population stddev (divide by N). Minperiod: `period`.

use serde::{Deserialize, Serialize};

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::basicops::{combine, div, stddev, sub};
use crate::indicators::movav::MovAv;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BollingerParams {
    pub period: usize,
    pub devfactor: f64,
    pub movav: MovAv,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            period: 20,
            devfactor: 2.0,
            movav: MovAv::Sma,
        }
    }
}

impl BollingerParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        check_period("bollinger", self.period)?;
        if !(self.devfactor.is_finite() && self.devfactor > 0.0) {
            return Err(IndicatorError::InvalidParameter {
                indicator: "bollinger",
                name: "devfactor",
                reason: format!("must be positive, got {}", self.devfactor),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BollingerLines {
    pub mid: LineRef,
    pub top: LineRef,
    pub bot: LineRef,
}

pub fn bollinger(
    g: &mut IndicatorGraph,
    input: LineRef,
    params: BollingerParams,
) -> Result<BollingerLines, IndicatorError> {
    params.validate()?;
    let mid = params.movav.build(g, input, params.period)?;
    let dev = stddev(g, input, params.period)?;
    let top = combine(g, mid, 1.0, dev, params.devfactor)?;
    let bot = combine(g, mid, 1.0, dev, -params.devfactor)?;
    Ok(BollingerLines { mid, top, bot })
}

/// Position of `input` within the bands: 0 at the bottom, 1 at the top.
pub fn bollinger_pct_b(
    g: &mut IndicatorGraph,
    input: LineRef,
    params: BollingerParams,
) -> Result<LineRef, IndicatorError> {
    let bands = bollinger(g, input, params)?;
    let above_bot = sub(g, input, bands.bot)?;
    let width = sub(g, bands.top, bands.bot)?;
    div(g, above_bot, width)
}
