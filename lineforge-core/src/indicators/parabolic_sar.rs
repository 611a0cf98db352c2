//! Parabolic SAR — Wilder's acceleration factor system.
//!
//! Inherently sequential/stateful: maintains direction, extreme point (EP),
//! and acceleration factor (AF).
//!
//! Parameters: af (default 0.02), af_step (default 0.02), af_max (default 0.20).
//! Inputs: high, low, close. Minperiod 2: the first two bars set the
//! initial direction. A NaN bar yields NaN and leaves the state untouched.

use serde::{Deserialize, Serialize};

use crate::engine::{IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::formula::{Formula, Inputs};
use crate::indicators::PriceLines;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PsarParams {
    pub af: f64,
    pub af_step: f64,
    pub af_max: f64,
}

impl Default for PsarParams {
    fn default() -> Self {
        Self {
            af: 0.02,
            af_step: 0.02,
            af_max: 0.20,
        }
    }
}

impl PsarParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        let invalid = |name: &'static str, reason: String| IndicatorError::InvalidParameter {
            indicator: "psar",
            name,
            reason,
        };
        if !(self.af.is_finite() && self.af > 0.0) {
            return Err(invalid("af", format!("must be > 0, got {}", self.af)));
        }
        if !(self.af_step.is_finite() && self.af_step > 0.0) {
            return Err(invalid("af_step", format!("must be > 0, got {}", self.af_step)));
        }
        if !(self.af_max.is_finite() && self.af_max >= self.af) {
            return Err(invalid("af_max", format!("must be >= af {}, got {}", self.af, self.af_max)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SarState {
    is_long: bool,
    af: f64,
    ep: f64,
    sar: f64,
}

#[derive(Debug, Clone)]
pub struct ParabolicSar {
    params: PsarParams,
    state: Option<SarState>,
}

impl ParabolicSar {
    pub fn new(params: PsarParams) -> Result<Self, IndicatorError> {
        params.validate()?;
        Ok(Self { params, state: None })
    }

    /// Initial direction from the previous and current bars.
    fn start(&mut self, inputs: &Inputs<'_>) -> f64 {
        let (h0, l0, c0) = (inputs.at(0, -1), inputs.at(1, -1), inputs.at(2, -1));
        let (h1, l1, c1) = (inputs.get(0), inputs.get(1), inputs.get(2));
        if [h0, l0, h1, l1].iter().any(|v| v.is_nan()) {
            return f64::NAN;
        }
        let is_long = c1 >= c0;
        let (sar, ep) = if is_long { (l0, h1) } else { (h0, l1) };
        self.state = Some(SarState {
            is_long,
            af: self.params.af,
            ep,
            sar,
        });
        sar
    }

    fn step(&self, mut s: SarState, inputs: &Inputs<'_>) -> SarState {
        let (high, low) = (inputs.get(0), inputs.get(1));
        let mut new_sar = s.sar + s.af * (s.ep - s.sar);

        if s.is_long {
            // In uptrend: SAR must not be above the two previous lows
            for back in [-1, -2] {
                let prev = inputs.at(1, back);
                if !prev.is_nan() {
                    new_sar = new_sar.min(prev);
                }
            }
            if low < new_sar {
                s.is_long = false;
                new_sar = s.ep;
                s.ep = low;
                s.af = self.params.af;
            } else if high > s.ep {
                s.ep = high;
                s.af = (s.af + self.params.af_step).min(self.params.af_max);
            }
        } else {
            // In downtrend: SAR must not be below the two previous highs
            for back in [-1, -2] {
                let prev = inputs.at(0, back);
                if !prev.is_nan() {
                    new_sar = new_sar.max(prev);
                }
            }
            if high > new_sar {
                s.is_long = true;
                new_sar = s.ep;
                s.ep = high;
                s.af = self.params.af;
            } else if low < s.ep {
                s.ep = low;
                s.af = (s.af + self.params.af_step).min(self.params.af_max);
            }
        }

        s.sar = new_sar;
        s
    }
}

impl Formula for ParabolicSar {
    fn name(&self) -> String {
        format!("psar({}, {}, {})", self.params.af, self.params.af_step, self.params.af_max)
    }

    fn arity(&self) -> usize {
        3
    }

    fn lookback(&self) -> usize {
        1
    }

    fn reset(&mut self) {
        self.state = None;
    }

    fn nextstart(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        self.state = None;
        out[0] = self.start(inputs);
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        let Some(state) = self.state else {
            out[0] = self.start(inputs);
            return;
        };
        if inputs.get(0).is_nan() || inputs.get(1).is_nan() || inputs.get(2).is_nan() {
            return;
        }
        let next = self.step(state, inputs);
        self.state = Some(next);
        out[0] = next.sar;
    }
}

pub fn psar(g: &mut IndicatorGraph, p: PriceLines, params: PsarParams) -> Result<LineRef, IndicatorError> {
    Ok(g.add(ParabolicSar::new(params)?, &[p.high, p.low, p.close])?.out())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{eval, leading_nans, ohlc_bars};

    fn run(data: &[(f64, f64, f64, f64)], params: PsarParams) -> Vec<f64> {
        eval(ohlc_bars(data), |g, p| Ok(vec![psar(g, p, params)?])).swap_remove(0)
    }

    #[test]
    fn psar_uptrend_below_price() {
        let data: Vec<_> = (0..10)
            .map(|i| {
                let base = 100.0 + i as f64 * 3.0;
                (base, base + 2.0, base - 1.0, base + 1.5)
            })
            .collect();
        let result = run(&data, PsarParams::default());
        assert_eq!(leading_nans(&result), 1);
        for i in 2..10 {
            assert!(result[i] < data[i].2, "PSAR {} above low {} at bar {i}", result[i], data[i].2);
        }
    }

    #[test]
    fn psar_downtrend_above_price() {
        let data: Vec<_> = (0..10)
            .map(|i| {
                let base = 200.0 - i as f64 * 3.0;
                (base, base + 1.0, base - 2.0, base - 1.5)
            })
            .collect();
        let result = run(&data, PsarParams::default());
        assert!((2..10).any(|i| result[i] > data[i].1));
    }

    #[test]
    fn psar_reversal_occurs() {
        let data = [
            (100.0, 105.0, 98.0, 103.0),
            (103.0, 108.0, 101.0, 107.0),
            (107.0, 112.0, 105.0, 111.0),
            (111.0, 115.0, 109.0, 114.0),
            // Sharp reversal
            (114.0, 114.5, 100.0, 101.0),
            (101.0, 102.0, 95.0, 96.0),
            (96.0, 97.0, 90.0, 91.0),
        ];
        let result = run(&data, PsarParams::default());
        assert!(result[1] < data[1].3);
        assert!((4..7).any(|i| result[i] > data[i].3), "PSAR should flip after reversal");
    }

    #[test]
    fn psar_nan_bar_preserves_state() {
        let mut data: Vec<_> = (0..8)
            .map(|i| {
                let base = 100.0 + i as f64;
                (base, base + 1.0, base - 0.5, base + 0.8)
            })
            .collect();
        let clean = run(&data, PsarParams::default());
        data.insert(4, (f64::NAN, f64::NAN, f64::NAN, f64::NAN));
        let gapped = run(&data, PsarParams::default());
        assert!(gapped[4].is_nan());
        assert_eq!(clean[3].to_bits(), gapped[3].to_bits());
        assert!(gapped[5].is_finite());
    }

    #[test]
    fn psar_too_few_bars() {
        let result = run(&[(100.0, 105.0, 95.0, 102.0)], PsarParams::default());
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn invalid_params() {
        let p = PsarParams {
            af_max: 0.01,
            ..PsarParams::default()
        };
        assert!(ParabolicSar::new(p).is_err());
    }
}
