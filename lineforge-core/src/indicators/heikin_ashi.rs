//! Heikin Ashi candles and HaDelta.
//!
//! ```text
//! ha_close = (o + h + l + c) / 4
//! ha_open  = (ha_open(−1) + ha_close(−1)) / 2, seeded with (o + c) / 2
//! ha_high  = max(h, ha_open, ha_close)
//! ha_low   = min(l, ha_open, ha_close)
//! ```
//!
//! The seed bar is not published: minperiod 2. HaDelta smooths
//! `ha_close − ha_open` with a moving average (minperiod `period + 1`).

use crate::engine::{IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::basicops::sub;
use crate::indicators::formula::{Formula, Inputs};
use crate::indicators::movav::MovAv;
use crate::indicators::PriceLines;

/// Inputs: open, high, low, close. Lines: open, high, low, close.
#[derive(Debug, Clone, Default)]
pub struct HeikinAshi {
    /// `(ha_open, ha_close)` of the previous bar.
    prev: Option<(f64, f64)>,
}

fn ha_close(o: f64, h: f64, l: f64, c: f64) -> f64 {
    (o + h + l + c) / 4.0
}

impl Formula for HeikinAshi {
    fn name(&self) -> String {
        "heikin_ashi".to_string()
    }

    fn lines(&self) -> &'static [&'static str] {
        &["open", "high", "low", "close"]
    }

    fn arity(&self) -> usize {
        4
    }

    fn lookback(&self) -> usize {
        1
    }

    fn reset(&mut self) {
        self.prev = None;
    }

    fn nextstart(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        let (o, h, l, c) = (inputs.at(0, -1), inputs.at(1, -1), inputs.at(2, -1), inputs.at(3, -1));
        self.prev = Some(((o + c) / 2.0, ha_close(o, h, l, c))).filter(|(a, b)| !a.is_nan() && !b.is_nan());
        self.next(inputs, out);
    }

    fn next(&mut self, inputs: &Inputs<'_>, out: &mut [f64]) {
        let (o, h, l, c) = (inputs.get(0), inputs.get(1), inputs.get(2), inputs.get(3));
        if [o, h, l, c].iter().any(|v| v.is_nan()) {
            return;
        }
        let close = ha_close(o, h, l, c);
        let open = match self.prev {
            Some((prev_open, prev_close)) => (prev_open + prev_close) / 2.0,
            None => (o + c) / 2.0,
        };
        self.prev = Some((open, close));
        out[0] = open;
        out[1] = h.max(open).max(close);
        out[2] = l.min(open).min(close);
        out[3] = close;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeikinAshiLines {
    pub open: LineRef,
    pub high: LineRef,
    pub low: LineRef,
    pub close: LineRef,
}

impl HeikinAshiLines {
    /// The candles as a price bundle, e.g. to feed other indicators.
    pub fn as_prices(&self, volume: LineRef) -> PriceLines {
        PriceLines {
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume,
        }
    }
}

pub fn heikin_ashi(g: &mut IndicatorGraph, p: PriceLines) -> Result<HeikinAshiLines, IndicatorError> {
    let node = g.add(HeikinAshi::default(), &[p.open, p.high, p.low, p.close])?;
    Ok(HeikinAshiLines {
        open: node.line(0),
        high: node.line(1),
        low: node.line(2),
        close: node.line(3),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HaDeltaLines {
    pub delta: LineRef,
    pub smoothed: LineRef,
}

pub fn ha_delta(
    g: &mut IndicatorGraph,
    p: PriceLines,
    period: usize,
    movav: MovAv,
) -> Result<HaDeltaLines, IndicatorError> {
    let ha = heikin_ashi(g, p)?;
    let delta = sub(g, ha.close, ha.open)?;
    let smoothed = movav.build(g, delta, period)?;
    Ok(HaDeltaLines { delta, smoothed })
}
