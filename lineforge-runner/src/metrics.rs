//! Performance metrics as pure functions of a value curve and trade list.
//!
//! Nothing here touches the engine: every input is an output of a finished
//! [`RunResult`](lineforge_core::RunResult).

use serde::{Deserialize, Serialize};

use lineforge_core::domain::Trade;

/// Bars per year used for annualisation.
pub const BARS_PER_YEAR: f64 = 252.0;

/// Aggregate performance metrics for a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub trade_count: usize,
    pub avg_trade_return: f64,
    pub avg_bars_held: f64,
    pub turnover: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub total_commission: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics.
    ///
    /// `value_curve` holds the broker value after each bar; `initial_capital`
    /// is treated as the value before the first bar.
    pub fn compute(value_curve: &[f64], trades: &[Trade], initial_capital: f64) -> Self {
        let mut equity = Vec::with_capacity(value_curve.len() + 1);
        equity.push(initial_capital);
        equity.extend_from_slice(value_curve);
        let bars = value_curve.len();
        Self {
            total_return: total_return(&equity),
            cagr: cagr(&equity, bars),
            sharpe: sharpe_ratio(&equity, 0.0),
            sortino: sortino_ratio(&equity, 0.0),
            calmar: calmar_ratio(&equity, bars),
            max_drawdown: max_drawdown(&equity),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            trade_count: trades.len(),
            avg_trade_return: avg_trade_return(trades),
            avg_bars_held: avg_bars_held(trades),
            turnover: turnover(trades, initial_capital, bars),
            max_consecutive_wins: max_consecutive(trades, true),
            max_consecutive_losses: max_consecutive(trades, false),
            total_commission: trades.iter().map(|t| t.commission).sum(),
        }
    }
}

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    match (equity_curve.first(), equity_curve.last()) {
        (Some(&initial), Some(&last)) if equity_curve.len() >= 2 && initial > 0.0 => {
            (last - initial) / initial
        }
        _ => 0.0,
    }
}

/// Compound annual growth rate over `bars` daily bars.
pub fn cagr(equity_curve: &[f64], bars: usize) -> f64 {
    let (Some(&initial), Some(&last)) = (equity_curve.first(), equity_curve.last()) else {
        return 0.0;
    };
    if bars < 2 || initial <= 0.0 || last <= 0.0 {
        return 0.0;
    }
    let years = bars as f64 / BARS_PER_YEAR;
    (last / initial).powf(1.0 / years) - 1.0
}

/// Annualized Sharpe ratio of per-bar returns.
///
/// Returns 0.0 if variance is zero or fewer than 2 returns exist.
pub fn sharpe_ratio(equity_curve: &[f64], risk_free_rate: f64) -> f64 {
    let excess = excess_returns(equity_curve, risk_free_rate);
    if excess.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&excess);
    if std < 1e-15 {
        return 0.0;
    }
    mean(&excess) / std * BARS_PER_YEAR.sqrt()
}

/// Annualized Sortino ratio (downside deviation only).
pub fn sortino_ratio(equity_curve: &[f64], risk_free_rate: f64) -> f64 {
    let excess = excess_returns(equity_curve, risk_free_rate);
    if excess.len() < 2 {
        return 0.0;
    }
    let downside: f64 = excess.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum();
    let downside_std = (downside / excess.len() as f64).sqrt();
    if downside_std < 1e-15 {
        return 0.0;
    }
    mean(&excess) / downside_std * BARS_PER_YEAR.sqrt()
}

/// CAGR / |max drawdown|, or 0.0 without a drawdown or a positive CAGR.
pub fn calmar_ratio(equity_curve: &[f64], bars: usize) -> f64 {
    let c = cagr(equity_curve, bars);
    let dd = max_drawdown(equity_curve);
    if dd >= 0.0 || c <= 0.0 {
        return 0.0;
    }
    c / dd.abs()
}

/// Maximum drawdown as a negative fraction (-0.15 = 15% below the peak).
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        peak = peak.max(eq);
        if peak > 0.0 {
            max_dd = max_dd.min((eq - peak) / peak);
        }
    }
    max_dd
}

/// Fraction of trades with positive net PnL.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| is_winner(t)).count() as f64 / trades.len() as f64
}

/// Gross profit / gross loss, capped at 100.0.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let gross_profit: f64 = trades.iter().map(|t| t.pnl_net.max(0.0)).sum();
    let gross_loss: f64 = trades.iter().map(|t| (-t.pnl_net).max(0.0)).sum();
    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

pub fn avg_trade_return(trades: &[Trade]) -> f64 {
    mean(&trades.iter().map(Trade::return_pct).collect::<Vec<_>>())
}

pub fn avg_bars_held(trades: &[Trade]) -> f64 {
    mean(&trades.iter().map(|t| t.bars_held() as f64).collect::<Vec<_>>())
}

/// Annual traded notional (entry plus exit) over initial capital.
pub fn turnover(trades: &[Trade], initial_capital: f64, bars: usize) -> f64 {
    if trades.is_empty() || initial_capital <= 0.0 || bars < 2 {
        return 0.0;
    }
    let notional: f64 = trades
        .iter()
        .map(|t| (t.entry_price + t.exit_price) * t.size)
        .sum();
    notional / initial_capital / (bars as f64 / BARS_PER_YEAR)
}

/// Longest run of winners (`winners = true`) or losers.
pub fn max_consecutive(trades: &[Trade], winners: bool) -> usize {
    let mut best = 0;
    let mut current = 0;
    for trade in trades {
        if is_winner(trade) == winners {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

fn is_winner(trade: &Trade) -> bool {
    trade.pnl_net > 0.0
}

/// Per-bar simple returns of an equity curve.
pub fn bar_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}

fn excess_returns(equity_curve: &[f64], risk_free_rate: f64) -> Vec<f64> {
    let per_bar_rf = risk_free_rate / BARS_PER_YEAR;
    bar_returns(equity_curve)
        .into_iter()
        .map(|r| r - per_bar_rf)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineforge_core::domain::{FeedId, Side, TradeId};

    fn make_trade(pnl_net: f64) -> Trade {
        Trade {
            id: TradeId(0),
            feed: FeedId(0),
            direction: Side::Buy,
            size: 10.0,
            entry_bar: 2,
            entry_price: 100.0,
            exit_bar: 7,
            exit_price: 100.0 + pnl_net / 10.0,
            pnl: pnl_net,
            commission: 0.0,
            pnl_net,
            full_close: true,
        }
    }

    #[test]
    fn total_return_basic() {
        assert!((total_return(&[100.0, 110.0, 120.0]) - 0.2).abs() < 1e-12);
        assert_eq!(total_return(&[100.0]), 0.0);
        assert_eq!(total_return(&[]), 0.0);
    }

    #[test]
    fn max_drawdown_tracks_running_peak() {
        let dd = max_drawdown(&[100.0, 120.0, 90.0, 130.0, 117.0]);
        assert!((dd - (-0.25)).abs() < 1e-12);
        assert_eq!(max_drawdown(&[100.0, 101.0, 102.0]), 0.0);
    }

    #[test]
    fn flat_curve_has_zero_ratios() {
        let flat = vec![100.0; 50];
        assert_eq!(sharpe_ratio(&flat, 0.0), 0.0);
        assert_eq!(sortino_ratio(&flat, 0.0), 0.0);
        assert_eq!(calmar_ratio(&flat, 49), 0.0);
        assert_eq!(cagr(&flat, 49), 0.0);
    }

    #[test]
    fn sortino_zero_without_losses() {
        let rising: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        assert!(sharpe_ratio(&rising, 0.0) > 0.0);
        assert_eq!(sortino_ratio(&rising, 0.0), 0.0);
    }

    #[test]
    fn cagr_one_year_doubling() {
        let mut curve = vec![100.0; 252];
        curve.push(200.0);
        assert!((cagr(&curve, 252) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn trade_statistics() {
        let trades = vec![
            make_trade(50.0),
            make_trade(-20.0),
            make_trade(-10.0),
            make_trade(30.0),
            make_trade(40.0),
        ];
        assert!((win_rate(&trades) - 0.6).abs() < 1e-12);
        assert!((profit_factor(&trades) - 4.0).abs() < 1e-12);
        assert_eq!(max_consecutive(&trades, true), 2);
        assert_eq!(max_consecutive(&trades, false), 2);
        assert!((avg_bars_held(&trades) - 5.0).abs() < 1e-12);
        assert!((avg_trade_return(&trades) - 0.018).abs() < 1e-12);
    }

    #[test]
    fn profit_factor_edge_cases() {
        assert_eq!(profit_factor(&[]), 0.0);
        assert_eq!(profit_factor(&[make_trade(10.0)]), 100.0);
        assert_eq!(profit_factor(&[make_trade(-10.0)]), 0.0);
    }

    #[test]
    fn compute_prepends_initial_capital() {
        let m = PerformanceMetrics::compute(&[110.0, 121.0], &[make_trade(21.0)], 100.0);
        assert!((m.total_return - 0.21).abs() < 1e-12);
        assert_eq!(m.trade_count, 1);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.win_rate, 1.0);
    }
}
