//! Concrete indicator formulas and their graph builders.
//!
//! Every indicator is a [`Formula`] registered on an
//! [`IndicatorGraph`](crate::engine::IndicatorGraph), or a small composition
//! of such nodes. Builders are free functions taking the graph and the input
//! [`LineRef`]s and returning the output line(s); composites return a struct
//! naming each line.
//!
//! Families are grouped one per module: moving averages, oscillators,
//! bands/channels and price transforms.

pub mod adx;
pub mod aroon;
pub mod atr;
pub mod awesome;
pub mod basicops;
pub mod bollinger;
pub mod cci;
pub mod crossover;
pub mod dema;
pub mod donchian;
pub mod dpo;
pub mod ema;
pub mod envelope;
pub mod formula;
pub mod heikin_ashi;
pub mod hma;
pub mod ichimoku;
pub mod kama;
pub mod keltner;
pub mod kst;
pub mod lrsi;
pub mod macd;
pub mod momentum;
pub mod movav;
pub mod parabolic_sar;
pub mod percent_rank;
pub mod pgo;
pub mod price;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod supertrend;
pub mod trix;
pub mod tsi;
pub mod ultimate;
pub mod vortex;
pub mod williams;
pub mod wma;
pub mod zlema;

pub use formula::{Formula, Inputs};
pub use movav::MovAv;

use crate::domain::FeedId;
use crate::engine::LineRef;

/// The OHLCV lines of one feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLines {
    pub open: LineRef,
    pub high: LineRef,
    pub low: LineRef,
    pub close: LineRef,
    pub volume: LineRef,
}

impl PriceLines {
    pub fn of(feed: FeedId) -> Self {
        Self {
            open: LineRef::open(feed),
            high: LineRef::high(feed),
            low: LineRef::low(feed),
            close: LineRef::close(feed),
            volume: LineRef::volume(feed),
        }
    }
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + 1.0;
            let low = open.min(close) - 1.0;
            Bar::new(base + chrono::Duration::days(i as i64), open, high, low, close, 1000.0)
        })
        .collect()
}

/// Bars from explicit `(open, high, low, close)` tuples, one day apart.
#[cfg(test)]
pub fn ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<crate::domain::Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| {
            crate::domain::Bar::new(base + chrono::Duration::days(i as i64), open, high, low, close, 1000.0)
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

/// Evaluate `build` over `bars` in both run modes, assert the two agree
/// bit-for-bit, and return the batch output lines.
#[cfg(test)]
pub fn eval<F>(bars: Vec<crate::domain::Bar>, build: F) -> Vec<Vec<f64>>
where
    F: Fn(
        &mut crate::engine::IndicatorGraph,
        PriceLines,
    ) -> Result<Vec<LineRef>, crate::engine::IndicatorError>,
{
    use crate::engine::RunModeKind;
    let batch = crate::ta::evaluate(bars.clone(), RunModeKind::Batch, &build).unwrap();
    let stepped = crate::ta::evaluate(bars, RunModeKind::Stepped, &build).unwrap();
    assert_eq!(batch.len(), stepped.len());
    for (b, s) in batch.iter().zip(&stepped) {
        assert_eq!(b.len(), s.len());
        for (i, (x, y)) in b.iter().zip(s).enumerate() {
            assert_eq!(x.to_bits(), y.to_bits(), "modes differ at bar {i}: {x} vs {y}");
        }
    }
    batch
}

/// [`eval`] over [`make_bars`] of `closes`, returning the first line.
#[cfg(test)]
pub fn eval_close<F>(closes: &[f64], build: F) -> Vec<f64>
where
    F: Fn(
        &mut crate::engine::IndicatorGraph,
        PriceLines,
    ) -> Result<Vec<LineRef>, crate::engine::IndicatorError>,
{
    eval(make_bars(closes), build).swap_remove(0)
}

/// Count of leading NaN samples.
#[cfg(test)]
pub fn leading_nans(values: &[f64]) -> usize {
    values.iter().take_while(|v| v.is_nan()).count()
}
