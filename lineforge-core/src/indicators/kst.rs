//! Know Sure Thing.
//!
//! `rcma_i = SMA(ROC100(x, rp_i), rma_i)`,
//! `kst = 1·rcma1 + 2·rcma2 + 3·rcma3 + 4·rcma4`, `signal = SMA(kst, psignal)`.
//! Minperiod of the signal `max(rp_i + rma_i) + psignal − 1` (48 by default).

use serde::{Deserialize, Serialize};

use crate::engine::{check_period, IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::basicops::combine;
use crate::indicators::roc::roc100;
use crate::indicators::sma::sma;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct KstParams {
    pub rp: [usize; 4],
    pub rma: [usize; 4],
    pub psignal: usize,
}

impl Default for KstParams {
    fn default() -> Self {
        Self {
            rp: [10, 15, 20, 30],
            rma: [10, 10, 10, 10],
            psignal: 9,
        }
    }
}

impl KstParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        for &p in self.rp.iter().chain(&self.rma) {
            check_period("kst", p)?;
        }
        check_period("kst", self.psignal)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KstLines {
    pub kst: LineRef,
    pub signal: LineRef,
}

pub fn kst(g: &mut IndicatorGraph, input: LineRef, params: KstParams) -> Result<KstLines, IndicatorError> {
    params.validate()?;
    let mut parts = Vec::with_capacity(4);
    for (&rp, &rma) in params.rp.iter().zip(&params.rma) {
        let roc = roc100(g, input, rp)?;
        parts.push(sma(g, roc, rma)?);
    }
    let low = combine(g, parts[0], 1.0, parts[1], 2.0)?;
    let high = combine(g, parts[2], 3.0, parts[3], 4.0)?;
    let line = combine(g, low, 1.0, high, 1.0)?;
    let signal = sma(g, line, params.psignal)?;
    Ok(KstLines { kst: line, signal })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{eval_close, leading_nans};

    #[test]
    fn kst_default_warmup() {
        let closes: Vec<f64> = (1..=70).map(|i| 100.0 + i as f64).collect();
        let k = eval_close(&closes, |g, p| Ok(vec![kst(g, p.close, KstParams::default())?.kst]));
        assert_eq!(leading_nans(&k), 39);
        let s = eval_close(&closes, |g, p| Ok(vec![kst(g, p.close, KstParams::default())?.signal]));
        assert_eq!(leading_nans(&s), 47);
        assert!(s[47..].iter().all(|v| *v > 0.0));
    }

    #[test]
    fn params_from_toml() {
        let params: KstParams = toml::from_str("psignal = 5").unwrap();
        assert_eq!(params.rp, [10, 15, 20, 30]);
        assert!(toml::from_str::<KstParams>("signal = 5").is_err());
    }
}
