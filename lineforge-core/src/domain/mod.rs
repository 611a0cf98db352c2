//! Domain types: bars, orders, fills, positions, trades, and their ids.

pub mod bar;
pub mod fill;
pub mod ids;
pub mod order;
pub mod position;
pub mod trade;

pub use bar::{Bar, BarPrices};
pub use fill::Fill;
pub use ids::{FeedId, NodeId, OrderId, TradeId};
pub use order::{ExecType, FillSizing, Order, OrderEvent, OrderRequest, OrderStatus, Side, Validity};
pub use position::{Position, PositionUpdate};
pub use trade::Trade;
