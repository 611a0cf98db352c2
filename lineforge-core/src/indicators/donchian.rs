//! Donchian Channel — highest high / lowest low over a lookback window.
//!
//! - upper: max(high[t-period+1..=t])
//! - lower: min(low[t-period+1..=t])
//! - middle: (upper + lower) / 2
//!
//! Minperiod: `period`.

use crate::engine::{IndicatorError, IndicatorGraph, LineRef};
use crate::indicators::basicops::{combine, highest, lowest};
use crate::indicators::PriceLines;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DonchianLines {
    pub upper: LineRef,
    pub middle: LineRef,
    pub lower: LineRef,
}

pub fn donchian(g: &mut IndicatorGraph, p: PriceLines, period: usize) -> Result<DonchianLines, IndicatorError> {
    let upper = highest(g, p.high, period)?;
    let lower = lowest(g, p.low, period)?;
    let middle = combine(g, upper, 0.5, lower, 0.5)?;
    Ok(DonchianLines { upper, middle, lower })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{eval, leading_nans, make_bars};

    #[test]
    fn channel_tracks_extremes() {
        // make_bars: high = max(open, close) + 1, low = min(open, close) - 1
        let lines = eval(make_bars(&[10.0, 12.0, 11.0, 9.0]), |g, p| {
            let d = donchian(g, p, 3)?;
            Ok(vec![d.upper, d.middle, d.lower])
        });
        assert_eq!(leading_nans(&lines[0]), 2);
        assert_eq!(lines[0][2], 13.0);
        assert_eq!(lines[2][2], 9.0);
        assert_eq!(lines[1][2], 11.0);
        assert_eq!(lines[2][3], 8.0);
    }

    #[test]
    fn zero_period_rejected() {
        let mut g = crate::engine::IndicatorGraph::new(1);
        assert!(donchian(&mut g, PriceLines::of(crate::domain::FeedId(0)), 0).is_err());
    }
}
