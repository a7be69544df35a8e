//! ledger.rs
//! Transient per-edge columns of a strategy run: accumulated change, include mask,
//! changed flag. Dense storage keyed by edge position.

use crate::error::{FlowGraphError, Result};
use crate::graph::{EdgeIndex, FlowGraph};

#[derive(Debug, Clone, Default)]
pub struct ChangeLedger {
    change: Vec<f64>,
    include: Vec<bool>,
    changed: Vec<bool>,
    /// Edges at positions `>= base_edges` were created during this run.
    base_edges: usize,
}

impl ChangeLedger {
    pub fn new(edge_count: usize) -> Self {
        Self {
            change: vec![0.0; edge_count],
            include: vec![false; edge_count],
            changed: vec![false; edge_count],
            base_edges: edge_count,
        }
    }

    pub fn ensure_capacity(&mut self, size: usize) {
        if self.change.len() < size {
            self.change.resize(size, 0.0);
            self.include.resize(size, false);
            self.changed.resize(size, false);
        }
    }

    #[inline(always)]
    pub fn change(&self, edge: EdgeIndex) -> f64 {
        self.change.get(edge.index()).copied().unwrap_or(0.0)
    }

    pub fn is_changed(&self, edge: EdgeIndex) -> bool {
        self.changed.get(edge.index()).copied().unwrap_or(false)
    }

    pub fn is_created(&self, edge: EdgeIndex) -> bool {
        edge.index() >= self.base_edges
    }

    pub fn include_mask(&self) -> &[bool] { &self.include }

    pub fn reset_include(&mut self) {
        self.include.iter_mut().for_each(|i| *i = false);
    }

    pub fn set_include(&mut self, edges: impl IntoIterator<Item = EdgeIndex>, value: bool) {
        for e in edges {
            self.ensure_capacity(e.index() + 1);
            self.include[e.index()] = value;
        }
    }

    /// Adds to the running change; later parts compose on top of earlier ones.
    pub fn add_change(&mut self, edge: EdgeIndex, delta: f64) {
        let idx = edge.index();
        self.ensure_capacity(idx + 1);
        self.change[idx] += delta;
        if self.change[idx] != 0.0 {
            self.changed[idx] = true;
        }
    }

    pub fn mark_changed(&mut self, edge: EdgeIndex) {
        self.ensure_capacity(edge.index() + 1);
        self.changed[edge.index()] = true;
    }

    /// Amount + accumulated change, in edge-position order.
    pub fn effective_amounts(&self, graph: &FlowGraph) -> Vec<f64> {
        graph
            .edge_indices()
            .map(|e| graph.amount(e) + self.change(e))
            .collect()
    }

    /// Writes `amount += change` into the graph and consumes the ledger.
    ///
    /// Amounts within `tolerance` below zero are clamped to zero; anything lower
    /// is an `InvalidState` and the graph is left untouched.
    pub fn bake(self, graph: &mut FlowGraph, tolerance: f64) -> Result<BakedChanges> {
        let mut finals = Vec::with_capacity(graph.edge_count());
        for e in graph.edge_indices() {
            let amount = graph.amount(e) + self.change(e);
            if amount < -tolerance || !amount.is_finite() {
                return Err(FlowGraphError::invalid_flow(
                    graph.flow(e).flow_id,
                    format!("amount would become {}", amount),
                ));
            }
            finals.push(amount.max(0.0));
        }

        let edges: Vec<EdgeIndex> = graph.edge_indices().collect();
        for (e, amount) in edges.into_iter().zip(finals) {
            graph.set_amount(e, amount);
        }

        let changed = graph.edge_indices().filter(|&e| self.is_changed(e)).collect();
        Ok(BakedChanges { changed, base_edges: self.base_edges })
    }
}

/// Edges flagged `changed` once the run's changes are written into the graph.
#[derive(Debug, Clone, Default)]
pub struct BakedChanges {
    pub changed: Vec<EdgeIndex>,
    pub base_edges: usize,
}

impl BakedChanges {
    pub fn is_created(&self, edge: EdgeIndex) -> bool {
        edge.index() >= self.base_edges
    }
}
