//! Cerebro — the top-level bar loop.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::broker::{Broker, Notification};
use crate::config::CerebroConfig;
use crate::domain::{Bar, FeedId, Order, Position, Trade};
use crate::engine::graph::IndicatorGraph;
use crate::engine::run_mode::RunModeKind;
use crate::engine::warmup::{Phase, WarmupState};
use crate::engine::EngineError;
use crate::feed::DataSeries;
use crate::sizers::{FixedSizer, Sizer};
use crate::strategy::{InitContext, Strategy, StrategyContext};

/// Lifecycle of the most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Initialized,
    Running,
    Finished,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub mode: RunModeKind,
    pub bars: usize,
    /// Bars needed before every indicator of the strategy is defined.
    pub minperiod: usize,
    /// Broker value after each bar.
    pub value_curve: Vec<f64>,
    pub cash_curve: Vec<f64>,
    /// Every order of the run with its full history.
    pub orders: Vec<Order>,
    pub trades: Vec<Trade>,
    /// Final position per feed.
    pub positions: Vec<Position>,
    pub final_cash: f64,
    pub final_value: f64,
}

pub struct Cerebro {
    config: CerebroConfig,
    feeds: Vec<DataSeries>,
    broker: Broker,
    sizer: Box<dyn Sizer>,
    state: RunState,
}

impl Cerebro {
    pub fn new(config: CerebroConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let broker = Broker::new(config.broker.clone())?;
        Ok(Self {
            config,
            feeds: Vec::new(),
            broker,
            sizer: Box::new(FixedSizer::default()),
            state: RunState::Initialized,
        })
    }

    pub fn config(&self) -> &CerebroConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    pub fn feeds(&self) -> &[DataSeries] {
        &self.feeds
    }

    /// Attach a feed built from `bars`. Feeds are addressed by attach order.
    pub fn add_data(&mut self, name: impl Into<String>, bars: Vec<Bar>) -> Result<FeedId, EngineError> {
        let series = DataSeries::new(name, bars)?;
        Ok(self.add_series(series))
    }

    pub fn add_series(&mut self, series: DataSeries) -> FeedId {
        self.feeds.push(series);
        FeedId(self.feeds.len() - 1)
    }

    /// Sizer used when a strategy buys or sells without a size.
    pub fn set_sizer(&mut self, sizer: impl Sizer + 'static) {
        self.sizer = Box::new(sizer);
    }

    /// Bar count shared by every feed.
    fn check_feeds(&self) -> Result<usize, EngineError> {
        let first = self.feeds.first().ok_or(EngineError::NoFeeds)?;
        let expected = first.total_len();
        for feed in &self.feeds[1..] {
            if feed.total_len() != expected {
                return Err(EngineError::FeedLengthMismatch {
                    name: feed.name().to_string(),
                    actual: feed.total_len(),
                    expected,
                });
            }
        }
        Ok(expected)
    }

    /// Replay every bar through `strategy`.
    ///
    /// Each run starts from reset feeds and broker and a fresh indicator
    /// graph, so `run` may be called repeatedly.
    pub fn run<S: Strategy + ?Sized>(&mut self, strategy: &mut S) -> Result<RunResult, EngineError> {
        let total = self.check_feeds()?;
        for feed in &mut self.feeds {
            feed.reset();
        }
        self.broker.reset(self.feeds.len());
        self.state = RunState::Initialized;

        let mut graph = IndicatorGraph::new(self.feeds.len());
        strategy.init(&mut InitContext::new(&mut graph, &self.feeds))?;
        graph.freeze();
        graph.reset();

        let minperiod = graph.minperiod().max(1);
        let mut warmup = WarmupState::new(minperiod);
        let kind = self.config.run_mode;
        let mode = kind.mode();
        info!(
            "run start: strategy={} mode={kind} feeds={} bars={total}",
            strategy.name(),
            self.feeds.len()
        );
        debug!("strategy minperiod {minperiod} over {} indicator nodes", graph.len());

        self.state = RunState::Running;
        mode.prepare(&mut self.feeds, &mut graph)?;

        let mut value_curve = Vec::with_capacity(total);
        let mut cash_curve = Vec::with_capacity(total);
        for bar in 0..total {
            mode.advance(&mut self.feeds, &mut graph, bar)?;
            deliver(strategy, self.broker.take_notifications());

            let phase = warmup.process_bar();
            let mut ctx = StrategyContext::new(bar, &self.feeds, &graph, &mut self.broker, self.sizer.as_ref());
            match phase {
                Phase::Prenext => strategy.prenext(&mut ctx),
                Phase::NextStart => strategy.nextstart(&mut ctx),
                Phase::Next => strategy.next(&mut ctx),
            }

            self.broker.resolve(bar, &self.feeds);
            self.broker.mark(bar, &self.feeds);
            value_curve.push(self.broker.value());
            cash_curve.push(self.broker.cash());
        }

        let last = total.saturating_sub(1);
        strategy.stop(&mut StrategyContext::new(
            last,
            &self.feeds,
            &graph,
            &mut self.broker,
            self.sizer.as_ref(),
        ));
        self.broker.cancel_pending(last, "run finished");
        deliver(strategy, self.broker.take_notifications());
        self.state = RunState::Finished;

        let result = RunResult {
            mode: kind,
            bars: total,
            minperiod,
            value_curve,
            cash_curve,
            orders: self.broker.orders().to_vec(),
            trades: self.broker.trades().to_vec(),
            positions: self.broker.positions().to_vec(),
            final_cash: self.broker.cash(),
            final_value: self.broker.value(),
        };
        info!(
            "run finished: mode={kind} bars={total} orders={} trades={} final value {:.2}",
            result.orders.len(),
            result.trades.len(),
            result.final_value
        );
        Ok(result)
    }
}

fn deliver<S: Strategy + ?Sized>(strategy: &mut S, notifications: Vec<Notification>) {
    for notification in notifications {
        match notification {
            Notification::Order(order) => strategy.notify_order(&order),
            Notification::Trade(trade) => strategy.notify_trade(&trade),
        }
    }
}
