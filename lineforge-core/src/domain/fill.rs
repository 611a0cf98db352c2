use serde::{Deserialize, Serialize};

use crate::domain::ids::{FeedId, OrderId};
use crate::domain::order::Side;

/// One execution against a bar. An order accumulates one or more fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub feed: FeedId,
    /// Bar whose prices produced this fill.
    pub bar: usize,
    pub side: Side,
    /// Executed size, always positive.
    pub size: f64,
    /// Execution price after slippage.
    pub price: f64,
    pub commission: f64,
}

impl Fill {
    pub fn new(
        order_id: OrderId,
        feed: FeedId,
        bar: usize,
        side: Side,
        size: f64,
        price: f64,
        commission: f64,
    ) -> Self {
        Self {
            order_id,
            feed,
            bar,
            side,
            size,
            price,
            commission,
        }
    }

    /// Signed size: positive for buys, negative for sells.
    pub fn signed_size(&self) -> f64 {
        self.side.sign() * self.size
    }
}
