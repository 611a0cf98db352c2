//! Kaufman Adaptive Moving Average (KAMA).
//!
//! Efficiency ratio `er = |x − x(−p)| / Σ|x − x(−1)|` over `p` changes,
//! smoothing constant `sc = (er·(fast − slow) + slow)²` with
//! `fast = 2/(fast_period+1)`, `slow = 2/(slow_period+1)`.
//! Seeded with the SMA of the last `p` inputs. Minperiod: `p + 1`.

use serde::{Deserialize, Serialize};

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::formula::{Formula, Inputs};
use crate::indicators::sma::mean;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct KamaParams {
    pub period: usize,
    pub fast: usize,
    pub slow: usize,
}

impl Default for KamaParams {
    fn default() -> Self {
        Self {
            period: 30,
            fast: 2,
            slow: 30,
        }
    }
}

impl KamaParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        check_period("kama", self.period)?;
        check_period("kama", self.fast)?;
        check_period("kama", self.slow)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Kama {
    params: KamaParams,
    fast_sc: f64,
    slow_sc: f64,
    prev: f64,
}

impl Kama {
    pub fn new(params: KamaParams) -> Result<Self, IndicatorError> {
        params.validate()?;
        Ok(Self {
            params,
            fast_sc: 2.0 / (params.fast as f64 + 1.0),
            slow_sc: 2.0 / (params.slow as f64 + 1.0),
            prev: f64::NAN,
        })
    }

    fn smoothing(&self, window: &[f64]) -> f64 {
        let direction = (window[window.len() - 1] - window[0]).abs();
        let volatility: f64 = window.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
        let er = if volatility == 0.0 { 0.0 } else { direction / volatility };
        let sc = er * (self.fast_sc - self.slow_sc) + self.slow_sc;
        sc * sc
    }
}

impl Formula for Kama {
    fn name(&self) -> String {
        format!("kama({}, {}, {})", self.params.period, self.params.fast, self.params.slow)
    }

    fn lookback(&self) -> usize {
        self.params.period
    }

    fn reset(&mut self) {
        self.prev = f64::NAN;
    }

    fn nextstart(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        self.prev = mean(inputs.window(0, self.params.period));
        out[0] = self.prev;
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        let window = inputs.window(0, self.params.period + 1);
        if window.is_empty() || window.iter().any(|v| v.is_nan()) {
            return;
        }
        if self.prev.is_nan() {
            self.nextstart(inputs, out);
            return;
        }
        let sc = self.smoothing(window);
        self.prev += sc * (inputs.get(0) - self.prev);
        out[0] = self.prev;
    }
}

pub fn kama(g: &mut IndicatorGraph, input: LineRef, params: KamaParams) -> Result<LineRef, IndicatorError> {
    Ok(g.add(Kama::new(params)?, &[input])?.out())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, eval_close, leading_nans, DEFAULT_EPSILON};

    fn params(period: usize) -> KamaParams {
        KamaParams {
            period,
            ..KamaParams::default()
        }
    }

    #[test]
    fn kama_seed_and_warmup() {
        let closes: Vec<f64> = (1..=20).map(f64::from).collect();
        let k = eval_close(&closes, |g, p| Ok(vec![kama(g, p.close, params(5))?]));
        assert_eq!(leading_nans(&k), 5);
        // Seed = mean(2..=6)
        assert_approx(k[5], 4.0, DEFAULT_EPSILON);
        // Perfectly efficient move: sc = fast² = (2/3)²
        let sc = (2.0f64 / 3.0).powi(2);
        assert_approx(k[6], 4.0 + sc * (7.0 - 4.0), DEFAULT_EPSILON);
    }

    #[test]
    fn kama_constant_input() {
        let k = eval_close(&[100.0; 50], |g, p| Ok(vec![kama(g, p.close, KamaParams::default())?]));
        assert_eq!(leading_nans(&k), 30);
        assert!(k[30..].iter().all(|v| (*v - 100.0).abs() < DEFAULT_EPSILON));
    }

    #[test]
    fn kama_rejects_zero() {
        assert!(Kama::new(params(0)).is_err());
    }

    #[test]
    fn params_deny_unknown_fields() {
        assert!(toml::from_str::<KamaParams>("period = 10\nfoo = 1").is_err());
        let p: KamaParams = toml::from_str("period = 10").unwrap();
        assert_eq!(p.slow, 30);
    }
}
