//! propagation.rs
//! Breadth-first change propagation with proportional redistribution.
//!
//! A change injected on one edge is spread over the visible edges around the
//! edge's target node: first against edge direction ("demand dictates supply"),
//! then with it. Each edge receives a share of the injected magnitude equal to its
//! part of the source's total output when the source branches, and to its part of
//! the examined node's total input otherwise. No edge is visited twice across the
//! two passes.

use crate::graph::{EdgeIndex, FlowGraph, FlowId, NodeIndex};
use petgraph::Direction as EdgeDirection;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::{BTreeMap, VecDeque};
use tracing::{trace, warn};

type EdgeList = SmallVec<[EdgeIndex; 8]>;

/// Direction of the first traversal pass; the second pass runs the other way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Upstream,
    Downstream,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Self::Upstream => Self::Downstream,
            Self::Downstream => Self::Upstream,
        }
    }

    /// Edges arriving at a node, as seen by a pass in this direction.
    fn inbound(self) -> EdgeDirection {
        match self {
            Self::Downstream => EdgeDirection::Incoming,
            Self::Upstream => EdgeDirection::Outgoing,
        }
    }

    fn outbound(self) -> EdgeDirection {
        self.inbound().opposite()
    }
}

/// The part of a graph one traversal can see: an include mask over edge
/// positions and the amounts shares are computed from.
#[derive(Debug, Clone)]
pub struct FlowView<'a> {
    graph: &'a FlowGraph,
    include: Cow<'a, [bool]>,
    amounts: Cow<'a, [f64]>,
}

impl<'a> FlowView<'a> {
    pub fn new(graph: &'a FlowGraph, include: &'a [bool], amounts: &'a [f64]) -> Self {
        Self { graph, include: Cow::Borrowed(include), amounts: Cow::Borrowed(amounts) }
    }

    /// Every edge visible, shares computed from the stored amounts.
    pub fn all(graph: &'a FlowGraph) -> Self {
        Self {
            graph,
            include: Cow::Owned(vec![true; graph.edge_count()]),
            amounts: Cow::Owned(graph.amounts()),
        }
    }

    pub fn graph(&self) -> &'a FlowGraph { self.graph }

    pub fn is_visible(&self, edge: EdgeIndex) -> bool {
        self.include.get(edge.index()).copied().unwrap_or(false)
    }

    fn amount(&self, edge: EdgeIndex) -> f64 {
        self.amounts
            .get(edge.index())
            .copied()
            .unwrap_or_else(|| self.graph.amount(edge))
    }

    fn edges(&self, node: NodeIndex, dir: EdgeDirection) -> EdgeList {
        self.graph
            .edges_directed(node, dir)
            .filter(|&e| self.is_visible(e))
            .collect()
    }

    /// Node at the far end of `edge` when walking in `dir`.
    fn head(&self, edge: EdgeIndex, dir: Direction) -> NodeIndex {
        let (s, t) = self.graph.endpoints(edge);
        match dir {
            Direction::Downstream => t,
            Direction::Upstream => s,
        }
    }

    fn tail(&self, edge: EdgeIndex, dir: Direction) -> NodeIndex {
        let (s, t) = self.graph.endpoints(edge);
        match dir {
            Direction::Downstream => s,
            Direction::Upstream => t,
        }
    }

    /// `amount(edge) / sum(amount(group))`, split evenly when the group carries nothing.
    fn share(&self, edge: EdgeIndex, group: &[EdgeIndex]) -> f64 {
        let total: f64 = group.iter().map(|&g| self.amount(g)).sum();
        if total > 0.0 {
            self.amount(edge) / total
        } else {
            1.0 / group.len().max(1) as f64
        }
    }
}

/// Signed change per edge position; untouched edges read as `0.0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeChangeMap {
    changes: Vec<f64>,
}

impl EdgeChangeMap {
    pub fn zeros(edge_count: usize) -> Self {
        Self { changes: vec![0.0; edge_count] }
    }

    pub fn get(&self, edge: EdgeIndex) -> f64 {
        self.changes.get(edge.index()).copied().unwrap_or(0.0)
    }

    fn record(&mut self, edge: EdgeIndex, change: f64) {
        if edge.index() >= self.changes.len() {
            self.changes.resize(edge.index() + 1, 0.0);
        }
        self.changes[edge.index()] = change;
    }

    pub fn iter_nonzero(&self) -> impl Iterator<Item = (EdgeIndex, f64)> + '_ {
        self.changes
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != 0.0)
            .map(|(i, &c)| (EdgeIndex::new(i), c))
    }

    pub fn total(&self) -> f64 { self.changes.iter().sum() }

    pub fn abs_total(&self) -> f64 { self.changes.iter().map(|c| c.abs()).sum() }

    /// Non-zero changes keyed by flow id.
    pub fn by_flow(&self, graph: &FlowGraph) -> BTreeMap<FlowId, f64> {
        self.iter_nonzero()
            .filter(|(e, _)| e.index() < graph.edge_count())
            .map(|(e, c)| (graph.flow(e).flow_id, c))
            .collect()
    }
}

/// Seam for swapping the redistribution algorithm.
pub trait Traversal {
    fn propagate(&self, view: &FlowView<'_>, start: EdgeIndex, magnitude: f64, first: Direction) -> EdgeChangeMap;

    /// Like `propagate`, addressed by flow id. An unknown flow yields no change.
    fn propagate_flow(&self, view: &FlowView<'_>, flow: FlowId, magnitude: f64, first: Direction) -> EdgeChangeMap {
        match view.graph().edge_of(flow) {
            Some(edge) => self.propagate(view, edge, magnitude, first),
            None => {
                warn!(flow_id = flow, "flow not present in graph, propagation skipped");
                EdgeChangeMap::zeros(view.graph().edge_count())
            }
        }
    }
}

/// State shared by both directional passes of one propagation.
struct PropagationContext {
    visited: Vec<bool>,
    changes: EdgeChangeMap,
    magnitude: f64,
}

impl PropagationContext {
    fn new(edge_count: usize, magnitude: f64) -> Self {
        Self { visited: vec![false; edge_count], changes: EdgeChangeMap::zeros(edge_count), magnitude }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChangePropagationEngine;

impl ChangePropagationEngine {
    pub fn new() -> Self { Self }

    fn pass(&self, view: &FlowView<'_>, start: NodeIndex, dir: Direction, ctx: &mut PropagationContext) {
        let mut discovered = vec![false; view.graph().node_count()];
        let mut queue = VecDeque::new();
        discovered[start.index()] = true;
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            self.examine(view, node, dir, ctx);
            for edge in view.edges(node, dir.outbound()) {
                let next = view.head(edge, dir);
                if !discovered[next.index()] {
                    discovered[next.index()] = true;
                    queue.push_back(next);
                }
            }
        }
    }

    /// Assigns a share of the magnitude to every unvisited inbound edge of `node`.
    fn examine(&self, view: &FlowView<'_>, node: NodeIndex, dir: Direction, ctx: &mut PropagationContext) {
        let inbound = view.edges(node, dir.inbound());
        for &edge in &inbound {
            if ctx.visited[edge.index()] {
                continue;
            }
            let source = view.tail(edge, dir);
            let siblings = view.edges(source, dir.outbound());
            let share = if siblings.len() > 1 {
                view.share(edge, &siblings)
            } else {
                view.share(edge, &inbound)
            };
            ctx.changes.record(edge, share * ctx.magnitude);
            ctx.visited[edge.index()] = true;
            trace!(flow_id = view.graph().flow(edge).flow_id, share, ?dir, "propagated change");
        }
    }
}

impl Traversal for ChangePropagationEngine {
    fn propagate(&self, view: &FlowView<'_>, start: EdgeIndex, magnitude: f64, first: Direction) -> EdgeChangeMap {
        let graph = view.graph();
        let mut ctx = PropagationContext::new(graph.edge_count(), magnitude);
        if start.index() >= graph.edge_count() {
            warn!(edge = start.index(), "start edge outside graph, propagation skipped");
            return ctx.changes;
        }

        let (_, node) = graph.endpoints(start);
        self.pass(view, node, first, &mut ctx);
        self.pass(view, node, first.reversed(), &mut ctx);
        ctx.changes
    }
}
