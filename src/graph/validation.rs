//! Structural validity report of a flow graph.
use super::network::FlowGraph;
use super::node::ActorId;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "actors", rename_all = "snake_case")]
pub enum ValidityReport {
    NoVertices,
    NoEdges,
    /// Actors that are not touched by any flow.
    IsolatedNodes(Vec<ActorId>),
    Valid,
}

impl ValidityReport {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for ValidityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoVertices => write!(f, "Graph is empty: no vertices"),
            Self::NoEdges => write!(f, "Graph is empty: no edges"),
            Self::IsolatedNodes(ids) => write!(f, "Graph has {} isolated actor(s): {:?}", ids.len(), ids),
            Self::Valid => write!(f, "Graph is valid"),
        }
    }
}

pub fn validate(graph: &FlowGraph) -> ValidityReport {
    if graph.node_count() == 0 {
        return ValidityReport::NoVertices;
    }
    if graph.edge_count() == 0 {
        return ValidityReport::NoEdges;
    }
    let isolated: Vec<ActorId> = graph
        .node_indices()
        .filter(|&n| graph.degree(n) == 0)
        .map(|n| graph.actor(n).actor_id)
        .collect();
    if isolated.is_empty() {
        ValidityReport::Valid
    } else {
        ValidityReport::IsolatedNodes(isolated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ActorNode, FlowEdge};

    #[test]
    fn test_empty_graph_reports_no_vertices() {
        assert_eq!(validate(&FlowGraph::new()), ValidityReport::NoVertices);
    }

    #[test]
    fn test_reports_no_edges_before_isolation() {
        let mut g = FlowGraph::new();
        g.add_actor(ActorNode::new(1, "A")).unwrap();
        assert_eq!(validate(&g), ValidityReport::NoEdges);
    }

    #[test]
    fn test_lists_isolated_actors() {
        let mut g = FlowGraph::new();
        let a = g.add_actor(ActorNode::new(1, "A")).unwrap();
        let b = g.add_actor(ActorNode::new(2, "B")).unwrap();
        g.add_actor(ActorNode::new(3, "C")).unwrap();
        g.add_flow(a, b, FlowEdge::new(1, 1, None, 1.0)).unwrap();
        let report = validate(&g);
        assert_eq!(report, ValidityReport::IsolatedNodes(vec![3]));
        assert!(!report.is_valid());
    }

    #[test]
    fn test_stock_only_actor_is_not_isolated() {
        let mut g = FlowGraph::new();
        let a = g.add_actor(ActorNode::new(1, "A")).unwrap();
        g.add_flow(a, a, FlowEdge::new(1, 1, None, 1.0)).unwrap();
        assert!(validate(&g).is_valid());
        assert_eq!(validate(&g).to_string(), "Graph is valid");
    }
}
