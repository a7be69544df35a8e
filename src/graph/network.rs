//! network.rs
//! Arena graph (petgraph, dense positions) plus stable flow-id and actor-id indices.
//!
//! Positions (`NodeIndex`, `EdgeIndex`) are only meaningful inside one in-memory
//! graph. Everything that leaves the graph (deltas, reports, lookups from callers)
//! goes through the flow id or the actor id.

use super::edge::{FlowEdge, FlowId, MaterialId, ProcessId};
use super::node::{ActorId, ActorNode};
use crate::error::{FlowGraphError, Result};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "GraphTables", try_from = "GraphTables")]
pub struct FlowGraph {
    graph: DiGraph<ActorNode, FlowEdge>,

    // Lookup indices, rebuilt from the tables on load.
    flow_index: HashMap<FlowId, EdgeIndex>,
    actor_index: HashMap<ActorId, NodeIndex>,
    next_flow_id: FlowId,
}

/// Display row of one flow, keyed by external ids only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSummary {
    pub id: FlowId,
    pub source: ActorId,
    pub target: ActorId,
    pub material: MaterialId,
    pub process: Option<ProcessId>,
    pub amount: f64,
}

impl FlowGraph {
    pub fn new() -> Self { Self::default() }

    pub fn node_count(&self) -> usize { self.graph.node_count() }
    pub fn edge_count(&self) -> usize { self.graph.edge_count() }

    /// Appends an actor. Fails if the actor is already part of the graph.
    pub fn add_actor(&mut self, node: ActorNode) -> Result<NodeIndex> {
        if self.actor_index.contains_key(&node.actor_id) {
            return Err(FlowGraphError::invalid(format!("actor {} added twice", node.actor_id)));
        }
        let actor_id = node.actor_id;
        let idx = self.graph.add_node(node);
        self.actor_index.insert(actor_id, idx);
        Ok(idx)
    }

    /// Returns the node of `node.actor_id`, appending it first when absent.
    pub fn ensure_actor(&mut self, node: ActorNode) -> NodeIndex {
        match self.actor_index.get(&node.actor_id) {
            Some(&idx) => idx,
            None => {
                let actor_id = node.actor_id;
                let idx = self.graph.add_node(node);
                self.actor_index.insert(actor_id, idx);
                idx
            }
        }
    }

    /// Adds a flow between two existing nodes. `source == target` models a stock.
    pub fn add_flow(&mut self, source: NodeIndex, target: NodeIndex, edge: FlowEdge) -> Result<EdgeIndex> {
        if self.flow_index.contains_key(&edge.flow_id) {
            return Err(FlowGraphError::Conflict { flow_id: edge.flow_id });
        }
        if source.index() >= self.graph.node_count() || target.index() >= self.graph.node_count() {
            return Err(FlowGraphError::invalid_flow(edge.flow_id, "flow endpoint is not a node of this graph"));
        }
        let flow_id = edge.flow_id;
        let idx = self.graph.add_edge(source, target, edge);
        self.flow_index.insert(flow_id, idx);
        self.next_flow_id = self.next_flow_id.max(flow_id.saturating_add(1));
        Ok(idx)
    }

    /// A flow id that no edge of this graph uses yet.
    pub fn next_flow_id(&self) -> FlowId {
        self.next_flow_id.max(1)
    }

    // --- Lookups ---

    pub fn node_of(&self, actor: ActorId) -> Option<NodeIndex> { self.actor_index.get(&actor).copied() }
    pub fn edge_of(&self, flow: FlowId) -> Option<EdgeIndex> { self.flow_index.get(&flow).copied() }

    pub fn actor(&self, node: NodeIndex) -> &ActorNode { &self.graph[node] }
    pub fn flow(&self, edge: EdgeIndex) -> &FlowEdge { &self.graph[edge] }
    pub fn amount(&self, edge: EdgeIndex) -> f64 { self.graph[edge].amount }

    pub fn set_amount(&mut self, edge: EdgeIndex, amount: f64) {
        self.graph[edge].amount = amount;
    }

    /// `(source, target)` of an edge. Both are equal for stocks.
    pub fn endpoints(&self, edge: EdgeIndex) -> (NodeIndex, NodeIndex) {
        // Every EdgeIndex handed out by this graph is valid: edges are never removed.
        self.graph
            .edge_endpoints(edge)
            .unwrap_or((NodeIndex::end(), NodeIndex::end()))
    }

    pub fn is_stock(&self, edge: EdgeIndex) -> bool {
        let (s, t) = self.endpoints(edge);
        s == t
    }

    /// Amount column in edge-position order.
    pub fn amounts(&self) -> Vec<f64> {
        self.graph.edge_weights().map(|e| e.amount).collect()
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ { self.graph.node_indices() }
    pub fn edge_indices(&self) -> impl Iterator<Item = EdgeIndex> + '_ { self.graph.edge_indices() }

    /// Edges leaving (`Outgoing`) or entering (`Incoming`) a node. Self-loops appear in both.
    pub fn edges_directed(&self, node: NodeIndex, dir: Direction) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edges_directed(node, dir).map(|e| e.id())
    }

    /// Number of edges touching `node`, counting a self-loop once.
    pub fn degree(&self, node: NodeIndex) -> usize {
        let out = self.graph.edges_directed(node, Direction::Outgoing).count();
        let inbound = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .filter(|e| e.source() != node)
            .count();
        out + inbound
    }

    pub fn flow_summaries(&self) -> Vec<FlowSummary> {
        self.graph
            .edge_indices()
            .map(|e| {
                let (s, t) = self.endpoints(e);
                let flow = &self.graph[e];
                FlowSummary {
                    id: flow.flow_id,
                    source: self.graph[s].actor_id,
                    target: self.graph[t].actor_id,
                    material: flow.material,
                    process: flow.process(),
                    amount: flow.amount,
                }
            })
            .collect()
    }
}

// --- Persistence tables ---

/// Flat node/edge tables, the serialized form of a `FlowGraph`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphTables {
    pub nodes: Vec<ActorNode>,
    pub edges: Vec<EdgeRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRow {
    /// Node positions in `GraphTables::nodes`.
    pub source: u32,
    pub target: u32,
    pub flow: FlowEdge,
}

impl From<FlowGraph> for GraphTables {
    fn from(g: FlowGraph) -> Self {
        let edges = g
            .graph
            .edge_indices()
            .map(|e| {
                let (s, t) = g.endpoints(e);
                EdgeRow { source: s.index() as u32, target: t.index() as u32, flow: g.graph[e].clone() }
            })
            .collect();
        let (nodes, _) = g.graph.into_nodes_edges();
        Self { nodes: nodes.into_iter().map(|n| n.weight).collect(), edges }
    }
}

impl TryFrom<GraphTables> for FlowGraph {
    type Error = FlowGraphError;

    fn try_from(tables: GraphTables) -> Result<Self> {
        let mut g = FlowGraph::new();
        let mut positions = Vec::with_capacity(tables.nodes.len());
        for node in tables.nodes {
            positions.push(g.add_actor(node)?);
        }
        for row in tables.edges {
            let (Some(&s), Some(&t)) = (positions.get(row.source as usize), positions.get(row.target as usize)) else {
                return Err(FlowGraphError::invalid_flow(row.flow.flow_id, "edge row points outside the node table"));
            };
            g.add_flow(s, t, row.flow)?;
        }
        Ok(g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_node_graph() -> (FlowGraph, NodeIndex, NodeIndex) {
        let mut g = FlowGraph::new();
        let a = g.add_actor(ActorNode::new(1, "A")).unwrap();
        let b = g.add_actor(ActorNode::new(2, "B")).unwrap();
        (g, a, b)
    }

    #[test]
    fn test_duplicate_flow_id_is_conflict() {
        let (mut g, a, b) = two_node_graph();
        g.add_flow(a, b, FlowEdge::new(10, 1, None, 5.0)).unwrap();
        let err = g.add_flow(b, a, FlowEdge::new(10, 1, None, 1.0)).unwrap_err();
        assert!(matches!(err, FlowGraphError::Conflict { flow_id: 10 }));
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_ensure_actor_reuses_existing_node() {
        let (mut g, a, _) = two_node_graph();
        assert_eq!(g.ensure_actor(ActorNode::new(1, "A again")), a);
        let c = g.ensure_actor(ActorNode::new(3, "C"));
        assert_eq!(g.node_of(3), Some(c));
        assert_eq!(g.node_count(), 3);
        assert!(g.add_actor(ActorNode::new(3, "C")).is_err());
    }

    #[test]
    fn test_next_flow_id_is_fresh() {
        let (mut g, a, b) = two_node_graph();
        assert_eq!(g.next_flow_id(), 1);
        g.add_flow(a, b, FlowEdge::new(41, 1, None, 5.0)).unwrap();
        g.add_flow(a, a, FlowEdge::new(7, 1, None, 5.0)).unwrap();
        assert_eq!(g.next_flow_id(), 42);
    }

    #[test]
    fn test_next_flow_id_saturates_at_max_id() {
        let (mut g, a, b) = two_node_graph();
        g.add_flow(a, b, FlowEdge::new(i64::MAX, 1, None, 1.0)).unwrap();
        assert_eq!(g.next_flow_id(), i64::MAX);
        let err = g.add_flow(b, a, FlowEdge::new(g.next_flow_id(), 1, None, 1.0)).unwrap_err();
        assert!(matches!(err, FlowGraphError::Conflict { flow_id: i64::MAX }));
    }

    #[test]
    fn test_stock_self_loop_counts_once() {
        let (mut g, a, b) = two_node_graph();
        let stock = g.add_flow(a, a, FlowEdge::new(1, 1, None, 3.0)).unwrap();
        g.add_flow(a, b, FlowEdge::new(2, 1, None, 3.0)).unwrap();
        assert!(g.is_stock(stock));
        assert_eq!(g.degree(a), 2);
        assert_eq!(g.degree(b), 1);
    }

    #[test]
    fn test_json_round_trip_rebuilds_indices() {
        let (mut g, a, b) = two_node_graph();
        g.add_flow(a, b, FlowEdge::new(5, 2, Some(3), 4.5)).unwrap();
        g.add_flow(b, b, FlowEdge::new(6, 2, None, 1.0)).unwrap();

        let json = serde_json::to_string(&g).unwrap();
        let back: FlowGraph = serde_json::from_str(&json).unwrap();

        let e = back.edge_of(5).expect("flow 5 indexed");
        assert_eq!(back.flow(e).process(), Some(3));
        assert_eq!(back.actor(back.endpoints(e).1).actor_id, 2);
        assert_eq!(back.next_flow_id(), 7);
        assert_eq!(back.flow_summaries(), g.flow_summaries());
    }

    #[test]
    fn test_tables_with_duplicate_flow_are_rejected() {
        let tables = GraphTables {
            nodes: vec![ActorNode::new(1, "A"), ActorNode::new(2, "B")],
            edges: vec![
                EdgeRow { source: 0, target: 1, flow: FlowEdge::new(9, 1, None, 1.0) },
                EdgeRow { source: 1, target: 0, flow: FlowEdge::new(9, 1, None, 2.0) },
            ],
        };
        let err = FlowGraph::try_from(tables).unwrap_err();
        assert!(matches!(err, FlowGraphError::Conflict { flow_id: 9 }));
    }

    #[test]
    fn test_tables_with_dangling_position_are_rejected() {
        let tables = GraphTables {
            nodes: vec![ActorNode::new(1, "A")],
            edges: vec![EdgeRow { source: 0, target: 4, flow: FlowEdge::new(1, 1, None, 1.0) }],
        };
        assert!(matches!(
            FlowGraph::try_from(tables),
            Err(FlowGraphError::InvalidState { flow_id: Some(1), .. })
        ));
    }
}
