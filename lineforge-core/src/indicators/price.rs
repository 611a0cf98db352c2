//! Price transforms with no warm-up.

use crate::engine::{IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::formula::{Formula, Inputs};
use crate::indicators::PriceLines;

/// Mean of its input lines.
#[derive(Debug, Clone)]
pub struct Average {
    label: &'static str,
    arity: usize,
}

impl Formula for Average {
    fn name(&self) -> String {
        self.label.to_string()
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn lookback(&self) -> usize {
        0
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        let sum: f64 = (0..self.arity).map(|k| inputs.get(k)).sum();
        out[0] = sum / self.arity as f64;
    }
}

/// `(high + low + close) / 3`
pub fn typical_price(g: &mut IndicatorGraph, p: PriceLines) -> Result<LineRef, IndicatorError> {
    let f = Average {
        label: "typical_price",
        arity: 3,
    };
    Ok(g.add(f, &[p.high, p.low, p.close])?.out())
}

/// `(high + low) / 2`
pub fn median_price(g: &mut IndicatorGraph, p: PriceLines) -> Result<LineRef, IndicatorError> {
    let f = Average {
        label: "median_price",
        arity: 2,
    };
    Ok(g.add(f, &[p.high, p.low])?.out())
}
