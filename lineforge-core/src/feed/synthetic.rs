//! Seeded synthetic bars for tests, benches, and sweeps.
//!
//! Prices follow a multiplicative random walk: each step moves the close by a
//! uniform draw in `[-volatility, +volatility]`. The same seed always yields
//! the same series.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::Bar;

/// First timestamp of every generated series (a Monday).
pub fn base_datetime() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 3)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Close prices of a seeded random walk of length `n`.
pub fn random_walk_prices(n: usize, start_price: f64, volatility: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = start_price;
    let mut prices = Vec::with_capacity(n);
    for i in 0..n {
        if i > 0 {
            let change: f64 = rng.gen_range(-1.0..=1.0) * volatility;
            price *= 1.0 + change;
        }
        prices.push(price);
    }
    prices
}

/// Daily OHLCV bars of a seeded random walk of length `n`.
///
/// open = previous close, high/low extend the open-close range by a further
/// random fraction of `volatility`, volume is uniform in `[100k, 1M)`.
pub fn random_walk(n: usize, start_price: f64, volatility: f64, seed: u64) -> Vec<Bar> {
    let closes = random_walk_prices(n, start_price, volatility, seed);
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(0x9e37_79b9));
    let base = base_datetime();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let up: f64 = rng.gen_range(0.0..=1.0) * volatility;
            let down: f64 = rng.gen_range(0.0..=1.0) * volatility;
            let high = open.max(close) * (1.0 + up);
            let low = open.min(close) * (1.0 - down);
            let volume = rng.gen_range(100_000.0..1_000_000.0_f64).floor();
            Bar::new(base + Duration::days(i as i64), open, high, low, close, volume)
        })
        .collect()
}

/// Flat daily bars (open = high = low = close) from a plain price sequence.
pub fn bars_from_prices(prices: &[f64]) -> Vec<Bar> {
    let base = base_datetime();
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| Bar::flat(base + Duration::days(i as i64), p, 1_000_000.0))
        .collect()
}
