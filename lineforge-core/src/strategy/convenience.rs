//! One-call SMA crossover backtest over a plain price series.

use serde::{Deserialize, Serialize};

use crate::broker::{BrokerConfig, MarginPolicy};
use crate::config::{CerebroConfig, ConfigError};
use crate::domain::Side;
use crate::engine::{Cerebro, EngineError, RunModeKind};
use crate::feed::synthetic::bars_from_prices;
use crate::sizers::AllInSizer;
use crate::strategy::{SmaCross, SmaCrossParams};

/// One executed fill of the convenience backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub side: Side,
    /// Bar of the fill.
    pub index: usize,
    pub price: f64,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    /// Per bar: +1 fast crossed above slow, -1 crossed below, 0 otherwise.
    pub signals: Vec<i8>,
    pub trades: Vec<TradeRecord>,
    pub initial_value: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub num_trades: usize,
}

/// Run a long-only, all-in SMA crossover over `prices`.
///
/// Every bar has open = high = low = close = price. Orders go in at the
/// signal bar's close and fill at the next bar's open.
pub fn simple_moving_average_strategy(
    prices: &[f64],
    short: usize,
    long: usize,
    initial_cash: f64,
) -> Result<StrategyReport, EngineError> {
    if !(initial_cash.is_finite() && initial_cash > 0.0) {
        return Err(ConfigError::Invalid(format!("initial cash must be positive, got {initial_cash}")).into());
    }
    let mut strategy = SmaCross::new(SmaCrossParams {
        fast: short,
        slow: long,
        long_only: true,
    })?;

    let broker = BrokerConfig {
        margin_policy: MarginPolicy::PartialFill,
        check_submit: false,
        allow_short: false,
        ..BrokerConfig::with_cash(initial_cash)
    };
    let mut cerebro = Cerebro::new(CerebroConfig::new(RunModeKind::Batch, broker))?;
    cerebro.add_data("prices", bars_from_prices(prices))?;
    cerebro.set_sizer(AllInSizer::new(false));
    let result = cerebro.run(&mut strategy)?;

    let mut fills: Vec<_> = result.orders.iter().flat_map(|o| o.fills.iter()).collect();
    fills.sort_by_key(|f| (f.bar, f.order_id));
    let trades: Vec<TradeRecord> = fills
        .into_iter()
        .map(|f| TradeRecord {
            side: f.side,
            index: f.bar,
            price: f.price,
            size: f.size,
        })
        .collect();

    let final_value = result.final_value;
    Ok(StrategyReport {
        signals: strategy.signals().to_vec(),
        num_trades: trades.len(),
        trades,
        initial_value: initial_cash,
        final_value,
        total_return: final_value / initial_cash - 1.0,
    })
}
