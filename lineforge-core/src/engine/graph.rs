//! Indicator graph — the per-run registry of indicator nodes.
//!
//! Nodes hold a boxed [`Formula`], non-owning [`LineRef`] back-references to
//! their inputs, their minperiod, and the output buffers they own. A node
//! can only reference lines that already exist when it is added, so the
//! graph is acyclic by construction. The evaluation order is computed once
//! (Kahn's algorithm) when the graph is frozen at the start of a run.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

use crate::domain::{FeedId, NodeId};
use crate::engine::EngineError;
use crate::feed::{DataSeries, Field};
use crate::indicators::formula::{Formula, Inputs};
use crate::lines::{LineBuffer, LineView};

/// Non-owning handle to a data line or an indicator output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineRef {
    Data { feed: FeedId, field: Field },
    Node { node: NodeId, line: usize },
}

impl LineRef {
    pub fn data(feed: FeedId, field: Field) -> Self {
        Self::Data { feed, field }
    }

    pub fn open(feed: FeedId) -> Self {
        Self::data(feed, Field::Open)
    }

    pub fn high(feed: FeedId) -> Self {
        Self::data(feed, Field::High)
    }

    pub fn low(feed: FeedId) -> Self {
        Self::data(feed, Field::Low)
    }

    pub fn close(feed: FeedId) -> Self {
        Self::data(feed, Field::Close)
    }

    pub fn volume(feed: FeedId) -> Self {
        Self::data(feed, Field::Volume)
    }
}

/// Configuration errors raised while building indicators.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IndicatorError {
    #[error("{indicator}: period must be >= 1, got {period}")]
    InvalidPeriod {
        indicator: &'static str,
        period: usize,
    },

    #[error("{indicator}: invalid parameter '{name}': {reason}")]
    InvalidParameter {
        indicator: &'static str,
        name: &'static str,
        reason: String,
    },

    #[error("unknown line reference {0:?}")]
    UnknownLine(LineRef),

    #[error("{indicator}: expected {expected} inputs, got {actual}")]
    InputArity {
        indicator: String,
        expected: usize,
        actual: usize,
    },

    #[error("input series lengths differ: {0:?}")]
    LengthMismatch(Vec<usize>),

    #[error("indicator graph is frozen; nodes must be added before the run starts")]
    FrozenGraph,
}

/// Reject a zero period.
pub fn check_period(indicator: &'static str, period: usize) -> Result<usize, IndicatorError> {
    if period == 0 {
        Err(IndicatorError::InvalidPeriod { indicator, period })
    } else {
        Ok(period)
    }
}

/// Handle returned when a node is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle {
    pub id: NodeId,
    lines: usize,
}

impl NodeHandle {
    /// Output line `k`. Panics in debug builds if `k` is out of range.
    pub fn line(&self, k: usize) -> LineRef {
        debug_assert!(k < self.lines, "node {} has {} lines", self.id, self.lines);
        LineRef::Node {
            node: self.id,
            line: k,
        }
    }

    /// The first (often only) output line.
    pub fn out(&self) -> LineRef {
        self.line(0)
    }

    pub fn line_count(&self) -> usize {
        self.lines
    }
}

#[derive(Debug, Clone)]
struct NodeSpec {
    name: String,
    inputs: Vec<LineRef>,
    minperiod: usize,
}

/// Explicit registry of every indicator used in one run.
pub struct IndicatorGraph {
    feed_count: usize,
    specs: Vec<NodeSpec>,
    formulas: Vec<Box<dyn Formula>>,
    outputs: Vec<Vec<LineBuffer>>,
    order: Vec<usize>,
    frozen: bool,
}

impl std::fmt::Debug for IndicatorGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndicatorGraph")
            .field("feed_count", &self.feed_count)
            .field("nodes", &self.specs)
            .field("frozen", &self.frozen)
            .finish()
    }
}

impl IndicatorGraph {
    pub fn new(feed_count: usize) -> Self {
        Self {
            feed_count,
            specs: Vec::new(),
            formulas: Vec::new(),
            outputs: Vec::new(),
            order: Vec::new(),
            frozen: false,
        }
    }

    pub fn feed_count(&self) -> usize {
        self.feed_count
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Register a formula over `inputs`.
    pub fn add<F: Formula + 'static>(
        &mut self,
        formula: F,
        inputs: &[LineRef],
    ) -> Result<NodeHandle, IndicatorError> {
        if self.frozen {
            return Err(IndicatorError::FrozenGraph);
        }
        if inputs.len() != formula.arity() {
            return Err(IndicatorError::InputArity {
                indicator: formula.name(),
                expected: formula.arity(),
                actual: inputs.len(),
            });
        }
        let mut input_minperiod = 1;
        for &input in inputs {
            input_minperiod = input_minperiod.max(self.minperiod_of(input)?);
        }
        let minperiod = input_minperiod + formula.lookback();
        let lines = formula.lines().len();
        let id = NodeId(self.specs.len());
        log::trace!("register {} as {} (minperiod {minperiod})", formula.name(), id);

        self.specs.push(NodeSpec {
            name: formula.name(),
            inputs: inputs.to_vec(),
            minperiod,
        });
        self.formulas.push(Box::new(formula));
        self.outputs.push(vec![LineBuffer::new(); lines]);
        Ok(NodeHandle { id, lines })
    }

    /// Minperiod of any line: 1 for data lines, the node's value otherwise.
    pub fn minperiod_of(&self, line: LineRef) -> Result<usize, IndicatorError> {
        match line {
            LineRef::Data { feed, .. } if feed.0 < self.feed_count => Ok(1),
            LineRef::Node { node, line: k } => match self.specs.get(node.0) {
                Some(spec) if k < self.outputs[node.0].len() => Ok(spec.minperiod),
                _ => Err(IndicatorError::UnknownLine(line)),
            },
            LineRef::Data { .. } => Err(IndicatorError::UnknownLine(line)),
        }
    }

    /// Largest minperiod across all nodes; 1 for an empty graph.
    pub fn minperiod(&self) -> usize {
        self.specs.iter().map(|s| s.minperiod).max().unwrap_or(1)
    }

    pub fn node_name(&self, node: NodeId) -> Option<&str> {
        self.specs.get(node.0).map(|s| s.name.as_str())
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Fix the evaluation order. Further `add` calls fail.
    pub fn freeze(&mut self) {
        if self.frozen {
            return;
        }
        self.order = self.topological_order();
        self.frozen = true;
    }

    fn topological_order(&self) -> Vec<usize> {
        let n = self.specs.len();
        let mut indegree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (j, spec) in self.specs.iter().enumerate() {
            for input in &spec.inputs {
                if let LineRef::Node { node, .. } = input {
                    indegree[j] += 1;
                    dependents[node.0].push(j);
                }
            }
        }
        let mut ready: VecDeque<usize> = (0..n).filter(|&j| indegree[j] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(j) = ready.pop_front() {
            order.push(j);
            for &d in &dependents[j] {
                indegree[d] -= 1;
                if indegree[d] == 0 {
                    ready.push_back(d);
                }
            }
        }
        debug_assert_eq!(order.len(), n, "indicator graph contains a cycle");
        order
    }

    /// Clear every output buffer and formula state. Called at run start.
    pub fn reset(&mut self) {
        for formula in &mut self.formulas {
            formula.reset();
        }
        for outputs in &mut self.outputs {
            for line in outputs {
                line.reset();
            }
        }
    }

    /// The buffer behind `line`, if it exists.
    pub fn buffer<'a>(&'a self, line: LineRef, feeds: &'a [DataSeries]) -> Option<&'a LineBuffer> {
        match line {
            LineRef::Data { feed, field } => feeds.get(feed.0).map(|f| f.line(field)),
            LineRef::Node { node, line: k } => self.outputs.get(node.0).and_then(|o| o.get(k)),
        }
    }

    /// View of `line` truncated at `bar`. Unknown lines read as empty.
    pub fn view_at<'a>(&'a self, line: LineRef, feeds: &'a [DataSeries], bar: usize) -> LineView<'a> {
        match self.buffer(line, feeds) {
            Some(buffer) => buffer.view_at(bar),
            None => LineView::new(&[]),
        }
    }

    /// Stepped evaluation: append one sample per output line for `bar`.
    ///
    /// Every input must hold exactly `bar + 1` samples.
    pub(crate) fn step(&mut self, feeds: &[DataSeries], bar: usize) -> Result<(), EngineError> {
        for idx in 0..self.order.len() {
            let j = self.order[idx];
            let mut outputs = std::mem::take(&mut self.outputs[j]);
            let spec = &self.specs[j];
            let lines = resolve_inputs(&spec.inputs, feeds, &self.outputs);
            if let Some(len) = lines.iter().map(|l| l.len()).find(|&len| len != bar + 1) {
                let detail = format!("{} input has {len} samples, expected {}", spec.name, bar + 1);
                self.outputs[j] = outputs;
                return Err(EngineError::Desync { bar, detail });
            }

            let mut row = vec![f64::NAN; outputs.len()];
            let first = spec.minperiod - 1;
            let view = Inputs::new(&lines, bar + 1);
            let formula = &mut self.formulas[j];
            if bar == first {
                formula.nextstart(&view, &mut row);
            } else if bar > first {
                formula.next(&view, &mut row);
            }
            for (line, value) in outputs.iter_mut().zip(&row) {
                line.append(*value);
            }
            drop(lines);
            self.outputs[j] = outputs;
        }
        Ok(())
    }

    /// Batch evaluation: fill every output buffer over `len` preloaded bars.
    pub(crate) fn precompute(&mut self, feeds: &[DataSeries], len: usize) -> Result<(), EngineError> {
        for idx in 0..self.order.len() {
            let j = self.order[idx];
            let spec = &self.specs[j];
            let lines = resolve_inputs(&spec.inputs, feeds, &self.outputs);
            if let Some(actual) = lines.iter().map(|l| l.len()).find(|&l| l != len) {
                let detail = format!("{} input has {actual} samples, expected {len}", spec.name);
                return Err(EngineError::Desync {
                    bar: len.saturating_sub(1),
                    detail,
                });
            }

            let line_count = self.outputs[j].len();
            let mut computed = vec![vec![f64::NAN; len]; line_count];
            self.formulas[j].once(&lines, spec.minperiod - 1, &mut computed);
            drop(lines);
            for (line, values) in self.outputs[j].iter_mut().zip(computed) {
                line.replace(values);
            }
        }
        Ok(())
    }
}

fn resolve_inputs<'a>(
    inputs: &[LineRef],
    feeds: &'a [DataSeries],
    outputs: &'a [Vec<LineBuffer>],
) -> Vec<&'a [f64]> {
    inputs
        .iter()
        .map(|input| match *input {
            LineRef::Data { feed, field } => feeds
                .get(feed.0)
                .map_or(&[][..], |f| f.line(field).as_slice()),
            LineRef::Node { node, line } => outputs
                .get(node.0)
                .and_then(|o| o.get(line))
                .map_or(&[][..], |b| b.as_slice()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::basicops::{Affine, Window, WindowOp};
    use crate::indicators::make_bars;

    fn feed(closes: &[f64]) -> DataSeries {
        DataSeries::new("t", make_bars(closes)).unwrap()
    }

    #[test]
    fn minperiod_composes_through_chain() {
        let mut g = IndicatorGraph::new(1);
        let close = LineRef::close(FeedId(0));
        let a = g.add(Window::new(WindowOp::Mean, 3).unwrap(), &[close]).unwrap();
        let b = g.add(Window::new(WindowOp::Mean, 4).unwrap(), &[a.out()]).unwrap();
        assert_eq!(g.minperiod_of(a.out()).unwrap(), 3);
        assert_eq!(g.minperiod_of(b.out()).unwrap(), 6);
        assert_eq!(g.minperiod(), 6);
    }

    #[test]
    fn unknown_lines_rejected() {
        let mut g = IndicatorGraph::new(1);
        let bad_feed = LineRef::close(FeedId(3));
        assert_eq!(
            g.add(Affine::new(1.0, 0.0), &[bad_feed]).unwrap_err(),
            IndicatorError::UnknownLine(bad_feed)
        );
        let bad_node = LineRef::Node { node: NodeId(0), line: 0 };
        assert!(matches!(
            g.add(Affine::new(1.0, 0.0), &[bad_node]),
            Err(IndicatorError::UnknownLine(_))
        ));
    }

    #[test]
    fn arity_checked() {
        let mut g = IndicatorGraph::new(1);
        let close = LineRef::close(FeedId(0));
        assert!(matches!(
            g.add(Affine::new(1.0, 0.0), &[close, close]),
            Err(IndicatorError::InputArity { expected: 1, actual: 2, .. })
        ));
    }

    #[test]
    fn frozen_graph_rejects_nodes() {
        let mut g = IndicatorGraph::new(1);
        g.freeze();
        assert_eq!(
            g.add(Affine::new(1.0, 0.0), &[LineRef::close(FeedId(0))]).unwrap_err(),
            IndicatorError::FrozenGraph
        );
    }

    #[test]
    fn empty_graph_minperiod_is_one() {
        assert_eq!(IndicatorGraph::new(0).minperiod(), 1);
    }

    #[test]
    fn step_and_precompute_agree() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let build = |g: &mut IndicatorGraph| {
            let close = LineRef::close(FeedId(0));
            let a = g.add(Window::new(WindowOp::Mean, 3).unwrap(), &[close]).unwrap();
            g.add(Window::new(WindowOp::Highest, 5).unwrap(), &[a.out()]).unwrap()
        };

        let mut stepped_feed = vec![feed(&closes)];
        let mut stepped = IndicatorGraph::new(1);
        let h1 = build(&mut stepped);
        stepped.freeze();
        for bar in 0..closes.len() {
            stepped_feed[0].advance();
            stepped.step(&stepped_feed, bar).unwrap();
        }

        let mut batch_feed = vec![feed(&closes)];
        batch_feed[0].preload();
        let mut batch = IndicatorGraph::new(1);
        let h2 = build(&mut batch);
        batch.freeze();
        batch.precompute(&batch_feed, closes.len()).unwrap();

        let s = stepped.buffer(h1.out(), &stepped_feed).unwrap().as_slice();
        let b = batch.buffer(h2.out(), &batch_feed).unwrap().as_slice();
        assert_eq!(s.len(), b.len());
        for (x, y) in s.iter().zip(b) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
        assert_eq!(s.iter().take_while(|v| v.is_nan()).count(), 6);
    }

    #[test]
    fn step_detects_desync() {
        let mut feeds = vec![feed(&[1.0, 2.0, 3.0])];
        let mut g = IndicatorGraph::new(1);
        g.add(Affine::new(2.0, 0.0), &[LineRef::close(FeedId(0))]).unwrap();
        g.freeze();
        feeds[0].advance();
        feeds[0].advance();
        assert!(matches!(
            g.step(&feeds, 0),
            Err(EngineError::Desync { bar: 0, .. })
        ));
    }

    #[test]
    fn reset_clears_outputs() {
        let mut feeds = vec![feed(&[1.0, 2.0])];
        feeds[0].preload();
        let mut g = IndicatorGraph::new(1);
        let h = g.add(Affine::new(2.0, 0.0), &[LineRef::close(FeedId(0))]).unwrap();
        g.freeze();
        g.precompute(&feeds, 2).unwrap();
        assert_eq!(g.buffer(h.out(), &feeds).unwrap().len(), 2);
        g.reset();
        assert!(g.buffer(h.out(), &feeds).unwrap().is_empty());
    }
}
