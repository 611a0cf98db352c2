//! Broker — cash, positions, order matching and trade extraction.
//!
//! Orders submitted during bar `t` are only ever matched at bar `t+1` or
//! later, against that bar's prices. Every status change and every trade is
//! queued as a [`Notification`] for delivery to the strategy.

pub mod config;
pub mod cost_model;
pub mod liquidity;
pub mod trigger;

pub use config::{BrokerConfig, MarginPolicy};
pub use cost_model::{Commission, CostModel, Slippage};
pub use liquidity::{LiquidityPolicy, RemainderPolicy};
pub use trigger::{check_trigger, GapPolicy, TriggerResult};

use crate::config::ConfigError;
use crate::domain::position::SIZE_EPSILON;
use crate::domain::{
    BarPrices, ExecType, FeedId, Fill, FillSizing, Order, OrderId, OrderRequest, OrderStatus, Position, Side, Trade,
    TradeId,
};
use crate::feed::{DataSeries, Field};
use crate::sizers::finish;

/// A queued event for the strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Snapshot of an order right after a status change.
    Order(Order),
    Trade(Trade),
}

/// Split a signed order quantity into the part that reduces the current
/// position and the part that opens or extends exposure. Both unsigned.
fn split_exposure(current: f64, signed_qty: f64) -> (f64, f64) {
    let qty = signed_qty.abs();
    if current.abs() <= SIZE_EPSILON || current.signum() == signed_qty.signum() {
        (0.0, qty)
    } else {
        let closing = qty.min(current.abs());
        (closing, qty - closing)
    }
}

#[derive(Debug, Clone)]
pub struct Broker {
    config: BrokerConfig,
    cost: CostModel,
    cash: f64,
    value: f64,
    positions: Vec<Position>,
    last_close: Vec<f64>,
    /// Indexed by `OrderId`.
    orders: Vec<Order>,
    /// Orders still eligible for matching, in submission order.
    pending: Vec<OrderId>,
    trades: Vec<Trade>,
    notifications: Vec<Notification>,
}

impl Broker {
    pub fn new(config: BrokerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let cost = config.cost_model();
        let cash = config.cash;
        Ok(Self {
            config,
            cost,
            cash,
            value: cash,
            positions: Vec::new(),
            last_close: Vec::new(),
            orders: Vec::new(),
            pending: Vec::new(),
            trades: Vec::new(),
            notifications: Vec::new(),
        })
    }

    /// Restore the starting state with one flat position per feed.
    pub fn reset(&mut self, feed_count: usize) {
        self.cash = self.config.cash;
        self.value = self.config.cash;
        self.positions = vec![Position::default(); feed_count];
        self.last_close = vec![f64::NAN; feed_count];
        self.orders.clear();
        self.pending.clear();
        self.trades.clear();
        self.notifications.clear();
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    /// Cash plus mark-to-market of every position, as of the last `mark`.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Current position on `feed`; flat for unknown feeds.
    pub fn position(&self, feed: FeedId) -> Position {
        self.positions.get(feed.0).cloned().unwrap_or_default()
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(id.0 as usize)
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Orders on `feed` still waiting for a match.
    pub fn pending_orders(&self, feed: FeedId) -> impl Iterator<Item = &Order> {
        self.pending
            .iter()
            .filter_map(|id| self.order(*id))
            .filter(move |o| o.feed == feed && o.status.is_alive())
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    fn set_status(&mut self, id: OrderId, status: OrderStatus, bar: usize) {
        let order = &mut self.orders[id.0 as usize];
        order.transition(status, bar);
        self.notifications.push(Notification::Order(order.clone()));
    }

    fn set_reason(&mut self, id: OrderId, reason: impl Into<String>) {
        self.orders[id.0 as usize].reason = Some(reason.into());
    }

    /// Accept or reject a new order issued during `bar`.
    pub fn submit(&mut self, request: OrderRequest, bar: usize, feeds: &[DataSeries]) -> OrderId {
        let id = OrderId(self.orders.len() as u64);
        self.orders.push(Order::new(id, request, bar));
        self.set_status(id, OrderStatus::Submitted, bar);

        match self.validate_submission(id, bar, feeds) {
            Ok(()) => {
                self.set_status(id, OrderStatus::Accepted, bar);
                self.pending.push(id);
            }
            Err(reason) => {
                log::warn!("order {id} rejected at bar {bar}: {reason}");
                self.set_reason(id, reason);
                self.set_status(id, OrderStatus::Rejected, bar);
            }
        }
        id
    }

    fn validate_submission(&self, id: OrderId, bar: usize, feeds: &[DataSeries]) -> Result<(), String> {
        let order = &self.orders[id.0 as usize];
        if !(order.size.is_finite() && order.size > 0.0) {
            return Err(format!("size must be positive and finite, got {}", order.size));
        }
        let Some(position) = self.positions.get(order.feed.0) else {
            return Err(format!("unknown feed {}", order.feed));
        };
        let needs_price = matches!(order.exec, ExecType::Limit | ExecType::Stop | ExecType::StopLimit);
        if needs_price && !order.price.is_some_and(f64::is_finite) {
            return Err(format!("{:?} order needs a finite price", order.exec));
        }
        if order.exec == ExecType::StopLimit && !order.limit_price.is_some_and(f64::is_finite) {
            return Err("StopLimit order needs a finite limit price".into());
        }

        let signed = order.side.sign() * order.size;
        if !self.config.allow_short {
            let committed: f64 = self
                .pending_orders(order.feed)
                .map(|o| o.side.sign() * o.remaining())
                .sum();
            if position.size + committed + signed < -SIZE_EPSILON {
                return Err("shorting is disabled".into());
            }
        }

        if self.config.check_submit {
            let (closing, increasing) = split_exposure(position.size, signed);
            let price = feeds
                .get(order.feed.0)
                .map(|f| f.line(Field::Close).get(bar))
                .filter(|p| p.is_finite())
                .or_else(|| self.last_close.get(order.feed.0).copied().filter(|p| p.is_finite()));
            if let (Some(price), true) = (price, increasing > SIZE_EPSILON) {
                let budget = self.budget(order.side, closing, price);
                let cost = increasing * self.cost.unit_cost(price);
                if cost > budget + 1e-9 {
                    return Err(format!(
                        "estimated cost {cost:.2} exceeds available cash {budget:.2}"
                    ));
                }
            }
        }
        Ok(())
    }

    /// Cash available for new exposure once the position-reducing part of a
    /// fill at `price` and the per-fill fee are paid.
    fn budget(&self, side: Side, closing: f64, price: f64) -> f64 {
        self.cash
            - side.sign() * closing * price * self.cost.mult
            - self.cost.variable_commission(price, closing)
            - self.cost.per_fill_fee()
    }

    /// Cancel an order that is still alive. Returns whether anything changed.
    pub fn cancel(&mut self, id: OrderId, bar: usize) -> bool {
        match self.order(id) {
            Some(order) if order.status.is_alive() => {
                self.cancel_with_reason(id, bar, "canceled by strategy");
                self.pending.retain(|p| *p != id);
                true
            }
            _ => false,
        }
    }

    fn cancel_with_reason(&mut self, id: OrderId, bar: usize, reason: &str) {
        log::debug!("order {id} canceled at bar {bar}: {reason}");
        self.set_reason(id, reason);
        self.set_status(id, OrderStatus::Canceled, bar);
    }

    /// Cancel every order still alive, e.g. at the end of a run.
    pub fn cancel_pending(&mut self, bar: usize, reason: &str) {
        for id in std::mem::take(&mut self.pending) {
            if self.orders[id.0 as usize].status.is_alive() {
                self.cancel_with_reason(id, bar, reason);
            }
        }
    }

    /// Match every order created before `bar` against `bar`'s prices.
    pub fn resolve(&mut self, bar: usize, feeds: &[DataSeries]) {
        let due = self.pending.clone();
        for id in due {
            let order = &self.orders[id.0 as usize];
            if !order.status.is_alive() || order.created_bar >= bar {
                continue;
            }
            if order.is_expired(bar) {
                self.cancel_with_reason(id, bar, "expired");
                continue;
            }
            let Some(prices) = feeds.get(order.feed.0).and_then(|f| f.prices_at(bar)) else {
                continue;
            };
            match check_trigger(order, &prices, self.config.gap_policy) {
                TriggerResult::NoTrigger => {}
                TriggerResult::Armed => {
                    log::debug!("order {id} armed at bar {bar}");
                    self.orders[id.0 as usize].armed = true;
                }
                TriggerResult::Fill { fill_price, .. } => {
                    self.execute(id, fill_price, &prices, bar);
                }
            }
        }

        // Orders whose last eligible bar was this one expire now.
        for id in self.pending.clone() {
            let order = &self.orders[id.0 as usize];
            if order.status.is_alive() && order.is_expired(bar + 1) {
                self.cancel_with_reason(id, bar, "expired");
            }
        }
        let orders = &self.orders;
        self.pending.retain(|id| orders[id.0 as usize].status.is_alive());
    }

    fn execute(&mut self, id: OrderId, raw_price: f64, prices: &BarPrices, bar: usize) {
        let order = &self.orders[id.0 as usize];
        let side = order.side;
        let feed = order.feed;
        let mut price = self.cost.apply_slippage(raw_price, side, prices);
        let limit = match order.exec {
            ExecType::Limit => order.price,
            ExecType::StopLimit => order.limit_price,
            _ => None,
        };
        if let Some(limit) = limit {
            price = match side {
                Side::Buy => price.min(limit),
                Side::Sell => price.max(limit),
            };
        }

        let fill_sizing = order.fill_sizing.filter(|_| order.executed_size <= SIZE_EPSILON);
        let mut qty = order.remaining();
        if let Some(sizing) = fill_sizing {
            let sized = self.size_at_fill(sizing, side, self.positions[feed.0].size, price);
            if sized <= SIZE_EPSILON {
                match sizing {
                    FillSizing::Flatten => self.cancel_with_reason(id, bar, "no position to close"),
                    FillSizing::CashPercent { .. } => self.margin(id, bar, qty, 0.0),
                }
                return;
            }
            log::debug!("order {id} resized from {qty} to {sized} at bar {bar}");
            self.orders[id.0 as usize].size = sized;
            qty = sized;
        }
        let mut liquidity_short = false;
        if let Some(liquidity) = self.config.liquidity {
            let (fill, rest) = liquidity.constrain(qty, prices.volume);
            liquidity_short = rest > SIZE_EPSILON;
            qty = fill;
            if qty <= SIZE_EPSILON {
                if liquidity.remainder == RemainderPolicy::Cancel {
                    self.cancel_with_reason(id, bar, "no liquidity");
                }
                return;
            }
        }

        let current = self.positions[feed.0].size;
        let (closing, mut increasing) = split_exposure(current, side.sign() * qty);
        let mut margin_short = false;
        if increasing > SIZE_EPSILON {
            let budget = self.budget(side, closing, price);
            let unit = self.cost.unit_cost(price);
            let affordable = if unit > 0.0 { budget.max(0.0) / unit } else { f64::INFINITY };
            if increasing > affordable + SIZE_EPSILON {
                match self.config.margin_policy {
                    MarginPolicy::Reject => {
                        self.margin(id, bar, increasing, affordable);
                        return;
                    }
                    MarginPolicy::PartialFill if affordable <= SIZE_EPSILON && closing <= SIZE_EPSILON => {
                        self.margin(id, bar, increasing, affordable);
                        return;
                    }
                    MarginPolicy::PartialFill => {
                        increasing = affordable;
                        margin_short = true;
                    }
                }
            }
        }
        let qty = closing + increasing;

        let commission = self.cost.compute_commission(price, qty);
        self.cash -= side.sign() * qty * price * self.cost.mult + commission;
        let update = self.positions[feed.0].update(side.sign() * qty, price, commission, bar);
        if update.closed > SIZE_EPSILON {
            let pnl = (price - update.entry_price) * update.closed * update.direction.sign() * self.cost.mult;
            let commission = update.entry_commission + update.exit_commission;
            let trade = Trade {
                id: TradeId(self.trades.len() as u64),
                feed,
                direction: update.direction,
                size: update.closed,
                entry_bar: update.entry_bar,
                entry_price: update.entry_price,
                exit_bar: bar,
                exit_price: price,
                pnl,
                commission,
                pnl_net: pnl - commission,
                full_close: update.full_close,
            };
            log::debug!("trade {} closed on {feed}: pnl {:.2}", trade.id, trade.pnl_net);
            self.notifications.push(Notification::Trade(trade.clone()));
            self.trades.push(trade);
        }

        log::debug!("order {id} filled {qty} @ {price:.4} at bar {bar}");
        let order = &mut self.orders[id.0 as usize];
        order.record_fill(Fill::new(id, feed, bar, side, qty, price, commission));
        let remaining = order.remaining();

        if remaining <= SIZE_EPSILON {
            self.set_status(id, OrderStatus::Completed, bar);
        } else if margin_short {
            log::warn!("order {id} partially filled at bar {bar}: remainder {remaining} exceeds cash");
            self.set_status(id, OrderStatus::PartiallyFilled, bar);
            self.cancel_with_reason(id, bar, "insufficient cash for remainder");
        } else {
            self.set_status(id, OrderStatus::PartiallyFilled, bar);
            let cancel = liquidity_short
                && self
                    .config
                    .liquidity
                    .is_some_and(|l| l.remainder == RemainderPolicy::Cancel);
            if cancel {
                self.cancel_with_reason(id, bar, "liquidity remainder canceled");
            }
        }
    }

    /// Unsigned fill size of a [`FillSizing`] order at `price`, given the
    /// signed position `current` just before the fill.
    fn size_at_fill(&self, sizing: FillSizing, side: Side, current: f64, price: f64) -> f64 {
        let opposing = current.abs() > SIZE_EPSILON && current.signum() != side.sign();
        let closing = if opposing { current.abs() } else { 0.0 };
        match sizing {
            FillSizing::Flatten => closing,
            FillSizing::CashPercent { percent, whole_units } => {
                let unit = self.cost.unit_cost(price);
                if !(unit.is_finite() && unit > 0.0) {
                    return closing;
                }
                let budget = self.budget(side, closing, price).max(0.0) * percent / 100.0;
                closing + finish(budget / unit, whole_units)
            }
        }
    }

    fn margin(&mut self, id: OrderId, bar: usize, needed: f64, affordable: f64) {
        log::warn!("order {id} margin at bar {bar}: needs {needed} units, cash covers {affordable:.4}");
        self.set_reason(id, "insufficient cash");
        self.set_status(id, OrderStatus::Margin, bar);
    }

    /// Mark every position to `bar`'s close and update `value`.
    ///
    /// A NaN close keeps the last known close for that feed.
    pub fn mark(&mut self, bar: usize, feeds: &[DataSeries]) {
        let mut value = self.cash;
        for (i, position) in self.positions.iter().enumerate() {
            let close = feeds.get(i).map_or(f64::NAN, |f| f.line(Field::Close).get(bar));
            if close.is_finite() {
                self.last_close[i] = close;
            }
            if position.is_flat() {
                continue;
            }
            let mark = if self.last_close[i].is_finite() {
                self.last_close[i]
            } else {
                position.price
            };
            value += position.market_value(mark, self.cost.mult);
        }
        self.value = value;
    }
}
