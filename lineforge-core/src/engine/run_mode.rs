//! Run modes — how data and indicator buffers fill up during a run.
//!
//! `Stepped` appends one bar to every feed and evaluates every node per bar.
//! `Batch` preloads every feed and precomputes every node before the bar loop,
//! then only checks that the buffers cover the bar being replayed. Both call
//! the same formula core, so their observations are identical.

use serde::{Deserialize, Serialize};

use crate::engine::graph::IndicatorGraph;
use crate::engine::EngineError;
use crate::feed::DataSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunModeKind {
    Stepped,
    #[default]
    Batch,
}

impl RunModeKind {
    pub fn mode(self) -> Box<dyn RunMode> {
        match self {
            RunModeKind::Stepped => Box::new(Stepped),
            RunModeKind::Batch => Box::new(Batch),
        }
    }
}

impl std::fmt::Display for RunModeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunModeKind::Stepped => write!(f, "stepped"),
            RunModeKind::Batch => write!(f, "batch"),
        }
    }
}

pub trait RunMode {
    fn kind(&self) -> RunModeKind;

    /// Called once after the graph is frozen, before bar 0.
    fn prepare(&self, feeds: &mut [DataSeries], graph: &mut IndicatorGraph) -> Result<(), EngineError>;

    /// Make bar `bar` observable on every feed and every indicator line.
    fn advance(
        &self,
        feeds: &mut [DataSeries],
        graph: &mut IndicatorGraph,
        bar: usize,
    ) -> Result<(), EngineError>;
}

/// Every feed line must hold exactly `expected` samples.
fn check_feeds(feeds: &[DataSeries], expected: usize, bar: usize) -> Result<(), EngineError> {
    for feed in feeds {
        feed.check_lockstep()?;
        if feed.len() != expected {
            return Err(EngineError::Desync {
                bar,
                detail: format!("feed '{}' has {} bars, expected {expected}", feed.name(), feed.len()),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Stepped;

impl RunMode for Stepped {
    fn kind(&self) -> RunModeKind {
        RunModeKind::Stepped
    }

    fn prepare(&self, _feeds: &mut [DataSeries], _graph: &mut IndicatorGraph) -> Result<(), EngineError> {
        Ok(())
    }

    fn advance(
        &self,
        feeds: &mut [DataSeries],
        graph: &mut IndicatorGraph,
        bar: usize,
    ) -> Result<(), EngineError> {
        for feed in feeds.iter_mut() {
            feed.advance();
        }
        check_feeds(feeds, bar + 1, bar)?;
        graph.step(feeds, bar)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Batch;

impl RunMode for Batch {
    fn kind(&self) -> RunModeKind {
        RunModeKind::Batch
    }

    fn prepare(&self, feeds: &mut [DataSeries], graph: &mut IndicatorGraph) -> Result<(), EngineError> {
        for feed in feeds.iter_mut() {
            feed.preload();
        }
        let len = feeds.first().map_or(0, DataSeries::total_len);
        check_feeds(feeds, len, 0)?;
        graph.precompute(feeds, len)?;
        log::debug!("precomputed {} indicator nodes over {len} bars", graph.len());
        Ok(())
    }

    fn advance(
        &self,
        feeds: &mut [DataSeries],
        _graph: &mut IndicatorGraph,
        bar: usize,
    ) -> Result<(), EngineError> {
        for feed in feeds.iter() {
            if feed.len() <= bar {
                return Err(EngineError::Desync {
                    bar,
                    detail: format!("feed '{}' was preloaded with only {} bars", feed.name(), feed.len()),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FeedId;
    use crate::engine::graph::LineRef;
    use crate::feed::Field;
    use crate::indicators::basicops::{Window, WindowOp};
    use crate::indicators::make_bars;

    fn feeds() -> Vec<DataSeries> {
        vec![DataSeries::new("t", make_bars(&[1.0, 2.0, 3.0, 4.0, 5.0])).unwrap()]
    }

    #[test]
    fn stepped_grows_one_bar_at_a_time() {
        let mut feeds = feeds();
        let mut graph = IndicatorGraph::new(1);
        let h = graph
            .add(Window::new(WindowOp::Sum, 2).unwrap(), &[LineRef::close(FeedId(0))])
            .unwrap();
        graph.freeze();
        let mode = RunModeKind::Stepped.mode();
        mode.prepare(&mut feeds, &mut graph).unwrap();
        mode.advance(&mut feeds, &mut graph, 0).unwrap();
        mode.advance(&mut feeds, &mut graph, 1).unwrap();
        assert_eq!(feeds[0].len(), 2);
        assert_eq!(graph.buffer(h.out(), &feeds).unwrap().as_slice()[1], 3.0);
    }

    #[test]
    fn batch_fills_everything_up_front() {
        let mut feeds = feeds();
        let mut graph = IndicatorGraph::new(1);
        let h = graph
            .add(Window::new(WindowOp::Sum, 2).unwrap(), &[LineRef::close(FeedId(0))])
            .unwrap();
        graph.freeze();
        let mode = RunModeKind::Batch.mode();
        mode.prepare(&mut feeds, &mut graph).unwrap();
        assert_eq!(feeds[0].len(), 5);
        assert_eq!(graph.buffer(h.out(), &feeds).unwrap().len(), 5);
        mode.advance(&mut feeds, &mut graph, 4).unwrap();
        assert!(matches!(
            mode.advance(&mut feeds, &mut graph, 5),
            Err(EngineError::Desync { bar: 5, .. })
        ));
    }

    #[test]
    fn stepped_detects_broken_lockstep() {
        let mut feeds = feeds();
        feeds[0].line_mut_for_test(Field::Volume).append(1.0);
        let mut graph = IndicatorGraph::new(1);
        graph.freeze();
        let err = Stepped.advance(&mut feeds, &mut graph, 0).unwrap_err();
        assert!(matches!(err, EngineError::Series(_)));
    }

    #[test]
    fn kind_round_trips_through_toml_names() {
        #[derive(Deserialize)]
        struct Holder {
            mode: RunModeKind,
        }
        let h: Holder = toml::from_str("mode = \"stepped\"").unwrap();
        assert_eq!(h.mode, RunModeKind::Stepped);
        assert_eq!(RunModeKind::default(), RunModeKind::Batch);
    }
}
