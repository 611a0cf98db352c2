//! Trade — an immutable record of a (full or partial) position close.

use serde::{Deserialize, Serialize};

use super::ids::{FeedId, TradeId};
use super::order::Side;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub feed: FeedId,
    /// `Buy` for a closed long, `Sell` for a closed short.
    pub direction: Side,
    /// Closed size, always positive.
    pub size: f64,

    pub entry_bar: usize,
    pub entry_price: f64,
    pub exit_bar: usize,
    pub exit_price: f64,

    /// `(exit - entry) × size × sign(direction) × mult`.
    pub pnl: f64,
    /// Entry and exit commission attributed to the closed size.
    pub commission: f64,
    pub pnl_net: f64,
    /// The position was closed entirely (or flipped) by this fill.
    pub full_close: bool,
}

impl Trade {
    pub fn is_long(&self) -> bool {
        self.direction == Side::Buy
    }

    pub fn bars_held(&self) -> usize {
        self.exit_bar.saturating_sub(self.entry_bar)
    }

    /// Net return as a fraction of entry notional.
    pub fn return_pct(&self) -> f64 {
        let notional = self.entry_price * self.size;
        if notional == 0.0 {
            return 0.0;
        }
        self.pnl_net / notional
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(direction: Side, entry: f64, exit: f64) -> Trade {
        let pnl = (exit - entry) * 10.0 * direction.sign();
        Trade {
            id: TradeId(0),
            feed: FeedId(0),
            direction,
            size: 10.0,
            entry_bar: 2,
            entry_price: entry,
            exit_bar: 7,
            exit_price: exit,
            pnl,
            commission: 1.0,
            pnl_net: pnl - 1.0,
            full_close: true,
        }
    }

    #[test]
    fn long_trade_return() {
        let t = trade(Side::Buy, 100.0, 110.0);
        assert_eq!(t.pnl, 100.0);
        assert!((t.return_pct() - 0.099).abs() < 1e-12);
        assert_eq!(t.bars_held(), 5);
    }

    #[test]
    fn short_trade_profits_on_decline() {
        let t = trade(Side::Sell, 100.0, 90.0);
        assert_eq!(t.pnl, 100.0);
        assert!(!t.is_long());
    }
}
