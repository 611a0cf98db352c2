//! Supertrend — ATR-based directional indicator.
//!
//! Inherently sequential/stateful: direction flips between support and resistance
//! based on close vs band comparisons.
//!
//! Inputs: high, low, close, ATR(period). Minperiod `period + 1`.
//!
//! Lines: `supertrend`, the active band (lower band when trending up, upper
//! band when trending down), and `direction`, +1 up or −1 down.

use serde::{Deserialize, Serialize};

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::atr::atr;
use crate::indicators::formula::{Formula, Inputs};
use crate::indicators::PriceLines;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SupertrendParams {
    pub period: usize,
    pub multiplier: f64,
}

impl Default for SupertrendParams {
    fn default() -> Self {
        Self {
            period: 10,
            multiplier: 3.0,
        }
    }
}

impl SupertrendParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        check_period("supertrend", self.period)?;
        if !(self.multiplier.is_finite() && self.multiplier > 0.0) {
            return Err(IndicatorError::InvalidParameter {
                indicator: "supertrend",
                name: "multiplier",
                reason: format!("must be positive, got {}", self.multiplier),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Bands {
    upper: f64,
    lower: f64,
    trending_up: bool,
}

#[derive(Debug, Clone)]
pub struct Supertrend {
    params: SupertrendParams,
    bands: Option<Bands>,
}

impl Supertrend {
    pub fn new(params: SupertrendParams) -> Result<Self, IndicatorError> {
        params.validate()?;
        Ok(Self { params, bands: None })
    }

    fn write(bands: Bands, out: &mut [f64]) {
        if bands.trending_up {
            out[0] = bands.lower;
            out[1] = 1.0;
        } else {
            out[0] = bands.upper;
            out[1] = -1.0;
        }
    }
}

impl Formula for Supertrend {
    fn name(&self) -> String {
        format!("supertrend({}, {})", self.params.period, self.params.multiplier)
    }

    fn lines(&self) -> &'static [&'static str] {
        &["supertrend", "direction"]
    }

    fn arity(&self) -> usize {
        4
    }

    fn lookback(&self) -> usize {
        0
    }

    fn reset(&mut self) {
        self.bands = None;
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        let (high, low, close, atr) = (inputs.get(0), inputs.get(1), inputs.get(2), inputs.get(3));
        if [high, low, close, atr].iter().any(|v| v.is_nan()) {
            return;
        }
        let hl2 = (high + low) / 2.0;
        let basic_upper = hl2 + self.params.multiplier * atr;
        let basic_lower = hl2 - self.params.multiplier * atr;

        let Some(prev) = self.bands else {
            // Start trending up (support)
            let bands = Bands {
                upper: basic_upper,
                lower: basic_lower,
                trending_up: true,
            };
            self.bands = Some(bands);
            Self::write(bands, out);
            return;
        };

        // Upper band can only decrease, lower band only increase, while price respects them
        let prev_close = inputs.at(2, -1);
        let upper = if !prev_close.is_nan() && prev_close <= prev.upper {
            basic_upper.min(prev.upper)
        } else {
            basic_upper
        };
        let lower = if !prev_close.is_nan() && prev_close >= prev.lower {
            basic_lower.max(prev.lower)
        } else {
            basic_lower
        };

        let trending_up = if prev.trending_up {
            close >= lower
        } else {
            close > upper
        };
        let bands = Bands {
            upper,
            lower,
            trending_up,
        };
        self.bands = Some(bands);
        Self::write(bands, out);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupertrendLines {
    pub supertrend: LineRef,
    pub direction: LineRef,
}

pub fn supertrend(
    g: &mut IndicatorGraph,
    p: PriceLines,
    params: SupertrendParams,
) -> Result<SupertrendLines, IndicatorError> {
    params.validate()?;
    let range = atr(g, p, params.period)?;
    let node = g.add(Supertrend::new(params)?, &[p.high, p.low, p.close, range])?;
    Ok(SupertrendLines {
        supertrend: node.line(0),
        direction: node.line(1),
    })
}
