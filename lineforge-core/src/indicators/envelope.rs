//! Envelope around a moving average, and the MA oscillator.
//!
//! Envelope: `mid = MA(x, p)`, `top = mid·(1 + perc/100)`, `bot = mid·(1 − perc/100)`.
//! Oscillator: `x − MA(x, p)`. Both inherit the average's minperiod.

use serde::{Deserialize, Serialize};

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::basicops::{affine, sub};
use crate::indicators::movav::MovAv;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct EnvelopeParams {
    pub period: usize,
    /// Band offset in percent of the average.
    pub perc: f64,
    pub movav: MovAv,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            period: 30,
            perc: 2.5,
            movav: MovAv::Sma,
        }
    }
}

impl EnvelopeParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        check_period("envelope", self.period)?;
        if !(self.perc.is_finite() && self.perc >= 0.0) {
            return Err(IndicatorError::InvalidParameter {
                indicator: "envelope",
                name: "perc",
                reason: format!("must be non-negative, got {}", self.perc),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeLines {
    pub mid: LineRef,
    pub top: LineRef,
    pub bot: LineRef,
}

pub fn envelope(
    g: &mut IndicatorGraph,
    input: LineRef,
    params: EnvelopeParams,
) -> Result<EnvelopeLines, IndicatorError> {
    params.validate()?;
    let mid = params.movav.build(g, input, params.period)?;
    let k = params.perc / 100.0;
    let top = affine(g, mid, 1.0 + k, 0.0)?;
    let bot = affine(g, mid, 1.0 - k, 0.0)?;
    Ok(EnvelopeLines { mid, top, bot })
}

/// `x − MA(x, period)`.
pub fn ma_oscillator(
    g: &mut IndicatorGraph,
    input: LineRef,
    movav: MovAv,
    period: usize,
) -> Result<LineRef, IndicatorError> {
    let ma = movav.build(g, input, period)?;
    sub(g, input, ma)
}
