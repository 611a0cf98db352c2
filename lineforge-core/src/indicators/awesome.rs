//! Awesome Oscillator and the Acceleration/Deceleration Oscillator.
//!
//! `AO = SMA(median, fast) − SMA(median, slow)` (minperiod `slow`).
//! `AccDec = AO − SMA(AO, period)` (minperiod `slow + period − 1`).

use serde::{Deserialize, Serialize};

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::basicops::sub;
use crate::indicators::movav::MovAv;
use crate::indicators::price::median_price;
use crate::indicators::PriceLines;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AwesomeParams {
    pub fast: usize,
    pub slow: usize,
    pub movav: MovAv,
}

impl Default for AwesomeParams {
    fn default() -> Self {
        Self {
            fast: 5,
            slow: 34,
            movav: MovAv::Sma,
        }
    }
}

impl AwesomeParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        check_period("awesome", self.fast)?;
        check_period("awesome", self.slow)?;
        Ok(())
    }
}

pub fn awesome_oscillator(
    g: &mut IndicatorGraph,
    p: PriceLines,
    params: AwesomeParams,
) -> Result<LineRef, IndicatorError> {
    params.validate()?;
    let median = median_price(g, p)?;
    let fast = params.movav.build(g, median, params.fast)?;
    let slow = params.movav.build(g, median, params.slow)?;
    sub(g, fast, slow)
}

pub fn accel_decel(
    g: &mut IndicatorGraph,
    p: PriceLines,
    params: AwesomeParams,
    period: usize,
) -> Result<LineRef, IndicatorError> {
    let ao = awesome_oscillator(g, p, params)?;
    let smoothed = params.movav.build(g, ao, period)?;
    sub(g, ao, smoothed)
}
