//! Numeric function surface: indicators over plain slices.
//!
//! Every function builds a one-feed [`IndicatorGraph`], evaluates it in batch
//! mode and returns output of the same length as the input, NaN-padded
//! through the warm-up. Multi-line indicators return a map keyed by line
//! name. [`evaluate`] runs an arbitrary graph in either mode.

use std::collections::BTreeMap;

use crate::domain::{Bar, FeedId};
use crate::engine::{EngineError, IndicatorError, IndicatorGraph, LineRef, RunModeKind};
use crate::feed::synthetic::{base_datetime, bars_from_prices};
use crate::feed::DataSeries;
use crate::indicators::{self as ind, MovAv, PriceLines};

/// Parallel OHLCV slices of equal length. Volume is optional.
#[derive(Debug, Clone, Copy)]
pub struct Ohlcv<'a> {
    pub open: &'a [f64],
    pub high: &'a [f64],
    pub low: &'a [f64],
    pub close: &'a [f64],
    pub volume: Option<&'a [f64]>,
}

impl<'a> Ohlcv<'a> {
    pub fn new(open: &'a [f64], high: &'a [f64], low: &'a [f64], close: &'a [f64]) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: &'a [f64]) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// Daily bars built from the slices.
    pub fn bars(&self) -> Result<Vec<Bar>, IndicatorError> {
        let mut lens = vec![self.open.len(), self.high.len(), self.low.len(), self.close.len()];
        if let Some(volume) = self.volume {
            lens.push(volume.len());
        }
        if lens.iter().any(|&l| l != lens[0]) {
            return Err(IndicatorError::LengthMismatch(lens));
        }
        let base = base_datetime();
        Ok((0..self.len())
            .map(|i| {
                let volume = self.volume.map_or(0.0, |v| v[i]);
                Bar::new(
                    base + chrono::Duration::days(i as i64),
                    self.open[i],
                    self.high[i],
                    self.low[i],
                    self.close[i],
                    volume,
                )
            })
            .collect())
    }
}

/// Run `build` over `bars` in `mode` and return the requested lines, one
/// sample per bar.
pub fn evaluate<F>(bars: Vec<Bar>, mode: RunModeKind, build: F) -> Result<Vec<Vec<f64>>, EngineError>
where
    F: FnOnce(&mut IndicatorGraph, PriceLines) -> Result<Vec<LineRef>, IndicatorError>,
{
    let mut feeds = vec![DataSeries::new("ta", bars)?];
    let mut graph = IndicatorGraph::new(1);
    let lines = build(&mut graph, PriceLines::of(FeedId(0)))?;
    graph.freeze();
    graph.reset();

    let runner = mode.mode();
    runner.prepare(&mut feeds, &mut graph)?;
    for bar in 0..feeds[0].total_len() {
        runner.advance(&mut feeds, &mut graph, bar)?;
    }
    Ok(lines
        .into_iter()
        .map(|line| {
            graph
                .buffer(line, &feeds)
                .map(|b| b.as_slice().to_vec())
                .unwrap_or_default()
        })
        .collect())
}

type Named = Vec<(&'static str, LineRef)>;

fn named<F>(bars: Vec<Bar>, build: F) -> Result<BTreeMap<String, Vec<f64>>, EngineError>
where
    F: FnOnce(&mut IndicatorGraph, PriceLines) -> Result<Named, IndicatorError>,
{
    let mut names = Vec::new();
    let values = evaluate(bars, RunModeKind::Batch, |g, p| {
        let lines = build(g, p)?;
        names = lines.iter().map(|(name, _)| *name).collect();
        Ok(lines.into_iter().map(|(_, line)| line).collect())
    })?;
    Ok(names.into_iter().map(String::from).zip(values).collect())
}

fn single<F>(values: &[f64], build: F) -> Result<Vec<f64>, EngineError>
where
    F: FnOnce(&mut IndicatorGraph, LineRef) -> Result<LineRef, IndicatorError>,
{
    let mut out = evaluate(bars_from_prices(values), RunModeKind::Batch, |g, p| {
        Ok(vec![build(g, p.close)?])
    })?;
    Ok(out.pop().unwrap_or_default())
}

fn single_named<F>(values: &[f64], build: F) -> Result<BTreeMap<String, Vec<f64>>, EngineError>
where
    F: FnOnce(&mut IndicatorGraph, LineRef) -> Result<Named, IndicatorError>,
{
    named(bars_from_prices(values), |g, p| build(g, p.close))
}

fn ohlc<F>(data: &Ohlcv<'_>, build: F) -> Result<Vec<f64>, EngineError>
where
    F: FnOnce(&mut IndicatorGraph, PriceLines) -> Result<LineRef, IndicatorError>,
{
    let mut out = evaluate(data.bars()?, RunModeKind::Batch, |g, p| Ok(vec![build(g, p)?]))?;
    Ok(out.pop().unwrap_or_default())
}

fn ohlc_named<F>(data: &Ohlcv<'_>, build: F) -> Result<BTreeMap<String, Vec<f64>>, EngineError>
where
    F: FnOnce(&mut IndicatorGraph, PriceLines) -> Result<Named, IndicatorError>,
{
    named(data.bars()?, build)
}

// Moving averages

pub fn sma(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::sma::sma(g, x, period))
}

pub fn ema(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::ema::ema(g, x, period))
}

pub fn smma(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::ema::smma(g, x, period))
}

pub fn wma(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::wma::wma(g, x, period))
}

pub fn dema(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::dema::dema(g, x, period))
}

pub fn tema(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::dema::tema(g, x, period))
}

pub fn hma(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::hma::hma(g, x, period))
}

pub fn zlema(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::zlema::zlema(g, x, period))
}

pub fn kama(values: &[f64], params: ind::kama::KamaParams) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::kama::kama(g, x, params))
}

pub fn moving_average(values: &[f64], kind: MovAv, period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| kind.build(g, x, period))
}

// Window statistics

pub fn highest(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::basicops::highest(g, x, period))
}

pub fn lowest(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::basicops::lowest(g, x, period))
}

pub fn sum_n(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::basicops::sum_n(g, x, period))
}

pub fn stddev(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::basicops::stddev(g, x, period))
}

// Momentum and oscillators over one line

pub fn momentum(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::momentum::momentum(g, x, period))
}

pub fn momentum_oscillator(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::momentum::momentum_oscillator(g, x, period))
}

pub fn roc(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::roc::roc(g, x, period))
}

pub fn roc100(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::roc::roc100(g, x, period))
}

pub fn pct_change(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::roc::pct_change(g, x, period))
}

pub fn rsi(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::rsi::rsi(g, x, period))
}

pub fn rmi(values: &[f64], period: usize, lookback: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::rsi::rmi(g, x, period, lookback))
}

pub fn laguerre_rsi(values: &[f64], params: ind::lrsi::LaguerreParams) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::lrsi::laguerre_rsi(g, x, params))
}

pub fn laguerre_filter(values: &[f64], gamma: f64) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::lrsi::laguerre_filter(g, x, gamma))
}

pub fn percent_rank(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::percent_rank::percent_rank(g, x, period))
}

pub fn tsi(values: &[f64], params: ind::tsi::TsiParams) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::tsi::tsi(g, x, params))
}

pub fn dpo(values: &[f64], period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::dpo::dpo(g, x, period, MovAv::Sma))
}

pub fn apo(values: &[f64], params: ind::macd::MacdParams) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::macd::apo(g, x, params))
}

pub fn ma_oscillator(values: &[f64], kind: MovAv, period: usize) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::envelope::ma_oscillator(g, x, kind, period))
}

pub fn macd(values: &[f64], params: ind::macd::MacdParams) -> Result<BTreeMap<String, Vec<f64>>, EngineError> {
    single_named(values, |g, x| {
        let m = ind::macd::macd(g, x, params)?;
        Ok(vec![("macd", m.macd), ("signal", m.signal), ("histo", m.histo)])
    })
}

pub fn ppo(values: &[f64], params: ind::macd::MacdParams) -> Result<BTreeMap<String, Vec<f64>>, EngineError> {
    single_named(values, |g, x| {
        let m = ind::macd::ppo(g, x, params)?;
        Ok(vec![("ppo", m.macd), ("signal", m.signal), ("histo", m.histo)])
    })
}

pub fn trix(values: &[f64], params: ind::trix::TrixParams) -> Result<BTreeMap<String, Vec<f64>>, EngineError> {
    single_named(values, |g, x| {
        let t = ind::trix::trix(g, x, params)?;
        Ok(vec![("trix", t.trix), ("signal", t.signal)])
    })
}

pub fn kst(values: &[f64], params: ind::kst::KstParams) -> Result<BTreeMap<String, Vec<f64>>, EngineError> {
    single_named(values, |g, x| {
        let k = ind::kst::kst(g, x, params)?;
        Ok(vec![("kst", k.kst), ("signal", k.signal)])
    })
}

pub fn bollinger(
    values: &[f64],
    params: ind::bollinger::BollingerParams,
) -> Result<BTreeMap<String, Vec<f64>>, EngineError> {
    single_named(values, |g, x| {
        let b = ind::bollinger::bollinger(g, x, params)?;
        Ok(vec![("mid", b.mid), ("top", b.top), ("bot", b.bot)])
    })
}

pub fn bollinger_pct_b(values: &[f64], params: ind::bollinger::BollingerParams) -> Result<Vec<f64>, EngineError> {
    single(values, |g, x| ind::bollinger::bollinger_pct_b(g, x, params))
}

pub fn envelope(
    values: &[f64],
    params: ind::envelope::EnvelopeParams,
) -> Result<BTreeMap<String, Vec<f64>>, EngineError> {
    single_named(values, |g, x| {
        let e = ind::envelope::envelope(g, x, params)?;
        Ok(vec![("mid", e.mid), ("top", e.top), ("bot", e.bot)])
    })
}

/// Crossings of `a` over `b`: +1 up, −1 down, 0 otherwise.
pub fn cross_over(a: &[f64], b: &[f64]) -> Result<Vec<f64>, EngineError> {
    let data = Ohlcv::new(a, a, b, a);
    ohlc(&data, |g, p| ind::crossover::cross_over(g, p.close, p.low))
}

// OHLC indicators

pub fn typical_price(data: &Ohlcv<'_>) -> Result<Vec<f64>, EngineError> {
    ohlc(data, ind::price::typical_price)
}

pub fn median_price(data: &Ohlcv<'_>) -> Result<Vec<f64>, EngineError> {
    ohlc(data, ind::price::median_price)
}

pub fn true_range(data: &Ohlcv<'_>) -> Result<Vec<f64>, EngineError> {
    ohlc(data, ind::atr::true_range)
}

pub fn atr(data: &Ohlcv<'_>, period: usize) -> Result<Vec<f64>, EngineError> {
    ohlc(data, |g, p| ind::atr::atr(g, p, period))
}

pub fn williams_r(data: &Ohlcv<'_>, period: usize) -> Result<Vec<f64>, EngineError> {
    ohlc(data, |g, p| ind::williams::williams_r(g, p, period))
}

pub fn williams_ad(data: &Ohlcv<'_>) -> Result<Vec<f64>, EngineError> {
    ohlc(data, ind::williams::williams_ad)
}

pub fn cci(data: &Ohlcv<'_>, params: ind::cci::CciParams) -> Result<Vec<f64>, EngineError> {
    ohlc(data, |g, p| ind::cci::cci(g, p, params))
}

pub fn ultimate_oscillator(data: &Ohlcv<'_>, params: ind::ultimate::UltimateParams) -> Result<Vec<f64>, EngineError> {
    ohlc(data, |g, p| ind::ultimate::ultimate_oscillator(g, p, params))
}

pub fn pgo(data: &Ohlcv<'_>, period: usize) -> Result<Vec<f64>, EngineError> {
    ohlc(data, |g, p| ind::pgo::pgo(g, p, period, MovAv::Sma))
}

pub fn psar(data: &Ohlcv<'_>, params: ind::parabolic_sar::PsarParams) -> Result<Vec<f64>, EngineError> {
    ohlc(data, |g, p| ind::parabolic_sar::psar(g, p, params))
}

pub fn awesome_oscillator(data: &Ohlcv<'_>, params: ind::awesome::AwesomeParams) -> Result<Vec<f64>, EngineError> {
    ohlc(data, |g, p| ind::awesome::awesome_oscillator(g, p, params))
}

pub fn accel_decel(
    data: &Ohlcv<'_>,
    params: ind::awesome::AwesomeParams,
    period: usize,
) -> Result<Vec<f64>, EngineError> {
    ohlc(data, |g, p| ind::awesome::accel_decel(g, p, params, period))
}

pub fn dv2(data: &Ohlcv<'_>, period: usize) -> Result<Vec<f64>, EngineError> {
    ohlc(data, |g, p| ind::percent_rank::dv2(g, p, period, 2, MovAv::Sma))
}

pub fn stochastic(
    data: &Ohlcv<'_>,
    params: ind::stochastic::StochasticParams,
) -> Result<BTreeMap<String, Vec<f64>>, EngineError> {
    ohlc_named(data, |g, p| {
        let s = ind::stochastic::stochastic(g, p, params)?;
        Ok(vec![("percK", s.k), ("percD", s.d)])
    })
}

pub fn stochastic_fast(
    data: &Ohlcv<'_>,
    params: ind::stochastic::StochasticParams,
) -> Result<BTreeMap<String, Vec<f64>>, EngineError> {
    ohlc_named(data, |g, p| {
        let s = ind::stochastic::stochastic_fast(g, p, params)?;
        Ok(vec![("percK", s.k), ("percD", s.d)])
    })
}

pub fn stochastic_full(
    data: &Ohlcv<'_>,
    params: ind::stochastic::StochasticParams,
) -> Result<BTreeMap<String, Vec<f64>>, EngineError> {
    ohlc_named(data, |g, p| {
        let s = ind::stochastic::stochastic_full(g, p, params)?;
        Ok(vec![("percK", s.k), ("percD", s.d), ("percDSlow", s.dslow)])
    })
}

pub fn aroon(data: &Ohlcv<'_>, period: usize) -> Result<BTreeMap<String, Vec<f64>>, EngineError> {
    ohlc_named(data, |g, p| {
        let a = ind::aroon::aroon(g, p, period)?;
        let osc = ind::basicops::sub(g, a.up, a.down)?;
        Ok(vec![("aroonup", a.up), ("aroondown", a.down), ("aroonosc", osc)])
    })
}

pub fn adx(data: &Ohlcv<'_>, period: usize) -> Result<BTreeMap<String, Vec<f64>>, EngineError> {
    ohlc_named(data, |g, p| {
        let a = ind::adx::adx(g, p, period)?;
        Ok(vec![
            ("plusDI", a.plus_di),
            ("minusDI", a.minus_di),
            ("dx", a.dx),
            ("adx", a.adx),
            ("adxr", a.adxr),
        ])
    })
}

pub fn vortex(data: &Ohlcv<'_>, period: usize) -> Result<BTreeMap<String, Vec<f64>>, EngineError> {
    ohlc_named(data, |g, p| {
        let v = ind::vortex::vortex(g, p, period)?;
        Ok(vec![("vi_plus", v.vi_plus), ("vi_minus", v.vi_minus)])
    })
}

pub fn donchian(data: &Ohlcv<'_>, period: usize) -> Result<BTreeMap<String, Vec<f64>>, EngineError> {
    ohlc_named(data, |g, p| {
        let d = ind::donchian::donchian(g, p, period)?;
        Ok(vec![("upper", d.upper), ("middle", d.middle), ("lower", d.lower)])
    })
}

pub fn keltner(
    data: &Ohlcv<'_>,
    params: ind::keltner::KeltnerParams,
) -> Result<BTreeMap<String, Vec<f64>>, EngineError> {
    ohlc_named(data, |g, p| {
        let k = ind::keltner::keltner(g, p, params)?;
        Ok(vec![("mid", k.mid), ("top", k.top), ("bot", k.bot)])
    })
}

pub fn ichimoku(
    data: &Ohlcv<'_>,
    params: ind::ichimoku::IchimokuParams,
) -> Result<BTreeMap<String, Vec<f64>>, EngineError> {
    ohlc_named(data, |g, p| {
        let i = ind::ichimoku::ichimoku(g, p, params)?;
        Ok(vec![
            ("tenkan_sen", i.tenkan_sen),
            ("kijun_sen", i.kijun_sen),
            ("senkou_span_a", i.senkou_span_a),
            ("senkou_span_b", i.senkou_span_b),
        ])
    })
}

pub fn supertrend(
    data: &Ohlcv<'_>,
    params: ind::supertrend::SupertrendParams,
) -> Result<BTreeMap<String, Vec<f64>>, EngineError> {
    ohlc_named(data, |g, p| {
        let s = ind::supertrend::supertrend(g, p, params)?;
        Ok(vec![("supertrend", s.supertrend), ("direction", s.direction)])
    })
}

pub fn heikin_ashi(data: &Ohlcv<'_>) -> Result<BTreeMap<String, Vec<f64>>, EngineError> {
    ohlc_named(data, |g, p| {
        let h = ind::heikin_ashi::heikin_ashi(g, p)?;
        Ok(vec![("ha_open", h.open), ("ha_high", h.high), ("ha_low", h.low), ("ha_close", h.close)])
    })
}

pub fn ha_delta(data: &Ohlcv<'_>, period: usize) -> Result<BTreeMap<String, Vec<f64>>, EngineError> {
    ohlc_named(data, |g, p| {
        let h = ind::heikin_ashi::ha_delta(g, p, period, MovAv::Sma)?;
        Ok(vec![("haDelta", h.delta), ("smoothed", h.smoothed)])
    })
}
