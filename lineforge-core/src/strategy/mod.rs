//! Strategy runtime — user callbacks and the context they trade through.
//!
//! A strategy registers its indicators once in [`Strategy::init`], then
//! receives one callback per bar. Until every indicator is defined that is
//! `prenext`; on the first fully defined bar it is `nextstart`, and `next`
//! afterwards. The [`StrategyContext`] only exposes samples up to the
//! current bar, whichever run mode filled the buffers.

pub mod convenience;
pub mod sma_cross;

pub use convenience::{simple_moving_average_strategy, StrategyReport};
pub use sma_cross::{SmaCross, SmaCrossParams};

use chrono::NaiveDateTime;

use crate::broker::Broker;
use crate::domain::position::SIZE_EPSILON;
use crate::domain::{FeedId, FillSizing, Order, OrderId, OrderRequest, Position, Side, Trade};
use crate::engine::{IndicatorError, IndicatorGraph, LineRef};
use crate::feed::{DataSeries, Field};
use crate::indicators::PriceLines;
use crate::lines::LineView;
use crate::sizers::{Sizer, SizingContext};

/// User trading logic driven by `Cerebro`.
pub trait Strategy {
    /// Register indicators. Called once per run, before the first bar.
    fn init(&mut self, ctx: &mut InitContext<'_>) -> Result<(), IndicatorError>;

    /// Bars before the strategy minperiod.
    fn prenext(&mut self, _ctx: &mut StrategyContext<'_>) {}

    /// The first bar on which every indicator is defined.
    fn nextstart(&mut self, ctx: &mut StrategyContext<'_>) {
        self.next(ctx);
    }

    fn next(&mut self, ctx: &mut StrategyContext<'_>);

    /// After the last bar, before pending orders are canceled.
    fn stop(&mut self, _ctx: &mut StrategyContext<'_>) {}

    fn notify_order(&mut self, _order: &Order) {}

    fn notify_trade(&mut self, _trade: &Trade) {}

    fn name(&self) -> &str {
        "strategy"
    }
}

/// What a strategy sees while registering indicators.
pub struct InitContext<'a> {
    graph: &'a mut IndicatorGraph,
    feeds: &'a [DataSeries],
}

impl<'a> InitContext<'a> {
    pub(crate) fn new(graph: &'a mut IndicatorGraph, feeds: &'a [DataSeries]) -> Self {
        Self { graph, feeds }
    }

    pub fn graph(&mut self) -> &mut IndicatorGraph {
        self.graph
    }

    pub fn feed_count(&self) -> usize {
        self.feeds.len()
    }

    pub fn feed_name(&self, feed: FeedId) -> Option<&str> {
        self.feeds.get(feed.0).map(DataSeries::name)
    }

    /// The price lines of `feed`.
    pub fn data(&self, feed: FeedId) -> PriceLines {
        PriceLines::of(feed)
    }
}

/// Per-bar view of data, indicators and broker, plus order entry.
pub struct StrategyContext<'a> {
    bar: usize,
    feeds: &'a [DataSeries],
    graph: &'a IndicatorGraph,
    broker: &'a mut Broker,
    sizer: &'a dyn Sizer,
}

impl<'a> StrategyContext<'a> {
    pub(crate) fn new(
        bar: usize,
        feeds: &'a [DataSeries],
        graph: &'a IndicatorGraph,
        broker: &'a mut Broker,
        sizer: &'a dyn Sizer,
    ) -> Self {
        Self {
            bar,
            feeds,
            graph,
            broker,
            sizer,
        }
    }

    /// Index of the current bar.
    pub fn bar(&self) -> usize {
        self.bar
    }

    pub fn datetime(&self, feed: FeedId) -> Option<NaiveDateTime> {
        self.feeds
            .get(feed.0)
            .and_then(|f| f.bars().get(self.bar))
            .map(|b| b.datetime)
    }

    /// Any line, truncated at the current bar.
    pub fn line(&self, line: LineRef) -> LineView<'a> {
        self.graph.view_at(line, self.feeds, self.bar)
    }

    /// Sample of `line` at `offset` (0 = current, -1 = previous bar).
    pub fn value(&self, line: LineRef, offset: isize) -> f64 {
        self.line(line).at(offset)
    }

    pub fn data(&self, feed: FeedId, field: Field) -> LineView<'a> {
        self.line(LineRef::data(feed, field))
    }

    pub fn close(&self, feed: FeedId) -> f64 {
        self.data(feed, Field::Close).current()
    }

    pub fn cash(&self) -> f64 {
        self.broker.cash()
    }

    /// Broker value as of the previous bar's close.
    pub fn portfolio_value(&self) -> f64 {
        self.broker.value()
    }

    pub fn position(&self, feed: FeedId) -> Position {
        self.broker.position(feed)
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.broker.order(id)
    }

    pub fn pending_orders(&self, feed: FeedId) -> Vec<&Order> {
        self.broker.pending_orders(feed).collect()
    }

    /// Hand any order request to the broker.
    pub fn submit(&mut self, request: OrderRequest) -> OrderId {
        self.broker.submit(request, self.bar, self.feeds)
    }

    pub fn cancel(&mut self, id: OrderId) -> bool {
        self.broker.cancel(id, self.bar)
    }

    /// Signed position on `feed` once every pending order on it has filled.
    ///
    /// Orders submitted this bar only fill on a later bar, so `position`
    /// alone lags behind what the strategy has already asked for.
    pub fn exposure(&self, feed: FeedId) -> f64 {
        let mut size = self.position(feed).size;
        for order in self.broker.pending_orders(feed) {
            let sign = order.side.sign();
            match order.fill_sizing {
                Some(FillSizing::Flatten) if size * sign < 0.0 => size = 0.0,
                Some(FillSizing::Flatten) => {}
                _ => size += sign * order.remaining(),
            }
        }
        size
    }

    /// Market buy sized by the configured sizer. `None` when it sizes to 0.
    pub fn buy(&mut self, feed: FeedId) -> Option<OrderId> {
        self.sized_market(feed, Side::Buy)
    }

    /// Market sell sized by the configured sizer. `None` when it sizes to 0.
    pub fn sell(&mut self, feed: FeedId) -> Option<OrderId> {
        self.sized_market(feed, Side::Sell)
    }

    /// Market order closing whatever position [`exposure`](Self::exposure)
    /// expects, sized against the real position at the fill. `None` when
    /// nothing is expected to be open.
    pub fn flatten(&mut self, feed: FeedId) -> Option<OrderId> {
        let exposure = self.exposure(feed);
        if exposure.abs() <= SIZE_EPSILON {
            return None;
        }
        let side = if exposure > 0.0 { Side::Sell } else { Side::Buy };
        let request = OrderRequest::market(feed, side, exposure.abs()).with_fill_sizing(FillSizing::Flatten);
        Some(self.submit(request))
    }

    pub fn buy_size(&mut self, feed: FeedId, size: f64) -> OrderId {
        self.submit(OrderRequest::market(feed, Side::Buy, size))
    }

    pub fn sell_size(&mut self, feed: FeedId, size: f64) -> OrderId {
        self.submit(OrderRequest::market(feed, Side::Sell, size))
    }

    /// Market order flattening the filled position. `None` when flat.
    ///
    /// Ignores pending orders; use [`flatten`](Self::flatten) to also undo
    /// entries that have not filled yet.
    pub fn close_position(&mut self, feed: FeedId) -> Option<OrderId> {
        self.order_target_size(feed, 0.0)
    }

    /// Market order moving the position to `target` units (signed).
    pub fn order_target_size(&mut self, feed: FeedId, target: f64) -> Option<OrderId> {
        let delta = target - self.position(feed).size;
        let side = if delta > 0.0 { Side::Buy } else { Side::Sell };
        self.market(feed, side, delta.abs())
    }

    /// Market order moving the position to `target` in value at the current close.
    pub fn order_target_value(&mut self, feed: FeedId, target: f64) -> Option<OrderId> {
        let unit = self.close(feed) * self.broker.cost_model().mult;
        if !(unit.is_finite() && unit > 0.0) {
            return None;
        }
        self.order_target_size(feed, target / unit)
    }

    /// Market order moving the position to `percent`% of portfolio value.
    pub fn order_target_percent(&mut self, feed: FeedId, percent: f64) -> Option<OrderId> {
        let target = self.portfolio_value() * percent / 100.0;
        self.order_target_value(feed, target)
    }

    fn default_size(&self, feed: FeedId, side: Side) -> f64 {
        let ctx = SizingContext {
            cash: self.cash(),
            value: self.portfolio_value(),
            price: self.close(feed),
            position: self.position(feed).size,
            side,
            mult: self.broker.cost_model().mult,
        };
        self.sizer.size(&ctx)
    }

    /// Sizers that resize at the fill still get an order when the estimate
    /// at the current close is 0, e.g. fully invested with an exit pending.
    /// The estimate then falls back to the whole portfolio value.
    fn sized_market(&mut self, feed: FeedId, side: Side) -> Option<OrderId> {
        let fill_sizing = self.sizer.fill_sizing();
        let mut size = self.default_size(feed, side);
        if fill_sizing.is_some() && !(size.is_finite() && size > SIZE_EPSILON) {
            let unit = self.close(feed) * self.broker.cost_model().mult;
            size = self.portfolio_value() / unit;
        }
        if !(size.is_finite() && size > SIZE_EPSILON) {
            return None;
        }
        let mut request = OrderRequest::market(feed, side, size);
        request.fill_sizing = fill_sizing;
        Some(self.submit(request))
    }

    fn market(&mut self, feed: FeedId, side: Side, size: f64) -> Option<OrderId> {
        if !(size.is_finite() && size > SIZE_EPSILON) {
            return None;
        }
        Some(self.submit(OrderRequest::market(feed, side, size)))
    }
}
