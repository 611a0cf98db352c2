//! Orders — requests issued by a strategy and their lifecycle inside the broker.
//!
//! Lifecycle:
//! ```text
//! Created → Submitted → Accepted → PartiallyFilled → Completed
//!                   ↘ Rejected          ↘ Canceled / Margin
//! ```
//! Completed, Canceled, Rejected and Margin are terminal.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::fill::Fill;
use super::ids::{FeedId, OrderId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// +1 for buys, -1 for sells.
    pub fn sign(self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// How the broker chooses the execution price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecType {
    /// Next bar's open.
    Market,
    /// Next bar's close.
    Close,
    /// Fill at `price` or better.
    Limit,
    /// Becomes a market order once `price` trades.
    Stop,
    /// Arms once `price` trades, then behaves as a limit at `limit_price`.
    StopLimit,
}

/// Order lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Validity {
    GoodTillCanceled,
    /// Only the bar right after creation is eligible.
    Day,
    /// Eligible up to and including this bar index.
    UntilBar(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Created,
    Submitted,
    Accepted,
    PartiallyFilled,
    Completed,
    Canceled,
    Rejected,
    Margin,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Canceled | Self::Rejected | Self::Margin
        )
    }

    /// Accepted or partially filled: still waiting for a match.
    pub fn is_alive(self) -> bool {
        matches!(self, Self::Accepted | Self::PartiallyFilled)
    }

    /// Legal state-machine edges.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Created, Submitted) => true,
            (Submitted, Accepted) | (Submitted, Rejected) => true,
            (Accepted, PartiallyFilled)
            | (Accepted, Completed)
            | (Accepted, Canceled)
            | (Accepted, Margin) => true,
            (PartiallyFilled, PartiallyFilled)
            | (PartiallyFilled, Completed)
            | (PartiallyFilled, Canceled)
            | (PartiallyFilled, Margin) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Size an order at its first fill instead of at submission.
///
/// The submitted size is an estimate used for validation and exposure
/// tracking; the broker replaces it with the size computed from the fill
/// price and the position at that moment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillSizing {
    /// Close any opposing position, then spend `percent`% of the remaining
    /// cash.
    CashPercent { percent: f64, whole_units: bool },
    /// Exactly the opposing position; nothing when there is none.
    Flatten,
}

/// What a strategy asks for. The broker turns it into an [`Order`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub feed: FeedId,
    pub side: Side,
    pub size: f64,
    pub exec: ExecType,
    /// Limit price for `Limit`, trigger price for `Stop` and `StopLimit`.
    pub price: Option<f64>,
    /// Limit price once a `StopLimit` is armed.
    pub limit_price: Option<f64>,
    pub validity: Validity,
    #[serde(default)]
    pub fill_sizing: Option<FillSizing>,
}

impl OrderRequest {
    pub fn market(feed: FeedId, side: Side, size: f64) -> Self {
        Self {
            feed,
            side,
            size,
            exec: ExecType::Market,
            price: None,
            limit_price: None,
            validity: Validity::GoodTillCanceled,
            fill_sizing: None,
        }
    }

    pub fn close(feed: FeedId, side: Side, size: f64) -> Self {
        Self {
            exec: ExecType::Close,
            ..Self::market(feed, side, size)
        }
    }

    pub fn limit(feed: FeedId, side: Side, size: f64, price: f64) -> Self {
        Self {
            exec: ExecType::Limit,
            price: Some(price),
            ..Self::market(feed, side, size)
        }
    }

    pub fn stop(feed: FeedId, side: Side, size: f64, price: f64) -> Self {
        Self {
            exec: ExecType::Stop,
            price: Some(price),
            ..Self::market(feed, side, size)
        }
    }

    pub fn stop_limit(feed: FeedId, side: Side, size: f64, stop: f64, limit: f64) -> Self {
        Self {
            exec: ExecType::StopLimit,
            price: Some(stop),
            limit_price: Some(limit),
            ..Self::market(feed, side, size)
        }
    }

    pub fn with_validity(mut self, validity: Validity) -> Self {
        self.validity = validity;
        self
    }

    pub fn with_fill_sizing(mut self, sizing: FillSizing) -> Self {
        self.fill_sizing = Some(sizing);
        self
    }
}

/// One entry in an order's audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub bar: usize,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub feed: FeedId,
    pub side: Side,
    /// Requested size, always positive. Replaced at the first fill when
    /// `fill_sizing` is set.
    pub size: f64,
    pub exec: ExecType,
    pub price: Option<f64>,
    pub limit_price: Option<f64>,
    pub validity: Validity,
    #[serde(default)]
    pub fill_sizing: Option<FillSizing>,
    /// Bar during which the strategy issued the order.
    pub created_bar: usize,
    pub status: OrderStatus,
    pub executed_size: f64,
    /// Σ fill price × fill size, for the average execution price.
    pub executed_value: f64,
    pub commission: f64,
    /// A stop-limit whose stop has traded.
    pub armed: bool,
    pub fills: Vec<Fill>,
    pub history: Vec<OrderEvent>,
    /// Why the order was rejected, canceled or margin-called.
    pub reason: Option<String>,
}

impl Order {
    pub(crate) fn new(id: OrderId, request: OrderRequest, bar: usize) -> Self {
        Self {
            id,
            feed: request.feed,
            side: request.side,
            size: request.size,
            exec: request.exec,
            price: request.price,
            limit_price: request.limit_price,
            validity: request.validity,
            fill_sizing: request.fill_sizing,
            created_bar: bar,
            status: OrderStatus::Created,
            executed_size: 0.0,
            executed_value: 0.0,
            commission: 0.0,
            armed: false,
            fills: Vec::new(),
            history: vec![OrderEvent {
                bar,
                status: OrderStatus::Created,
            }],
            reason: None,
        }
    }

    pub fn remaining(&self) -> f64 {
        (self.size - self.executed_size).max(0.0)
    }

    /// Average execution price, NaN before the first fill.
    pub fn avg_price(&self) -> f64 {
        if self.executed_size > 0.0 {
            self.executed_value / self.executed_size
        } else {
            f64::NAN
        }
    }

    pub fn is_buy(&self) -> bool {
        self.side == Side::Buy
    }

    /// Whether the order can no longer be matched at `bar`.
    pub fn is_expired(&self, bar: usize) -> bool {
        match self.validity {
            Validity::GoodTillCanceled => false,
            Validity::Day => bar > self.created_bar + 1,
            Validity::UntilBar(last) => bar > last,
        }
    }

    pub(crate) fn transition(&mut self, status: OrderStatus, bar: usize) {
        debug_assert!(
            self.status.can_transition_to(status),
            "invalid transition for order {}: {} → {}",
            self.id,
            self.status,
            status
        );
        self.status = status;
        self.history.push(OrderEvent { bar, status });
    }

    pub(crate) fn record_fill(&mut self, fill: Fill) {
        self.executed_size += fill.size;
        self.executed_value += fill.size * fill.price;
        self.commission += fill.commission;
        self.fills.push(fill);
    }
}
