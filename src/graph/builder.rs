//! Builds the baseline flow graph of a keyflow from the record source.
use super::edge::FlowEdge;
use super::network::FlowGraph;
use super::node::{ActorId, ActorNode};
use crate::error::{FlowGraphError, Result};
use crate::source::{FlowRecordSource, KeyflowId};
use crate::store::{GraphStore, SnapshotKey};
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};

pub struct FlowGraphBuilder<'a> {
    source: &'a dyn FlowRecordSource,
    store: &'a dyn GraphStore,
}

impl<'a> FlowGraphBuilder<'a> {
    pub fn new(source: &'a dyn FlowRecordSource, store: &'a dyn GraphStore) -> Self {
        Self { source, store }
    }

    /// Builds the baseline graph of `keyflow` and saves it under the baseline key.
    ///
    /// A known keyflow without flows yields an empty (but persisted) graph; an
    /// unknown keyflow fails with `NotFound`.
    pub fn build(&self, keyflow: KeyflowId, tag: Option<&str>) -> Result<FlowGraph> {
        let graph = self.assemble(keyflow)?;
        let key = SnapshotKey::base(keyflow, tag);
        self.store.save(&key, &graph)?;
        info!(
            keyflow,
            snapshot = %key,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built baseline graph"
        );
        Ok(graph)
    }

    /// Assembles the graph without persisting it.
    pub fn assemble(&self, keyflow: KeyflowId) -> Result<FlowGraph> {
        let flows = self.source.list_flows(keyflow, false)?;
        let stocks = self.source.list_flows(keyflow, true)?;

        // 1. Actors referenced as origin of any flow or destination of a non-stock flow
        let mut actor_ids: BTreeSet<ActorId> = flows.iter().chain(&stocks).map(|f| f.origin).collect();
        actor_ids.extend(flows.iter().filter_map(|f| f.destination));

        let mut actors = self.source.list_actors(&actor_ids)?;
        actors.sort_by_key(|a| a.id);

        let mut graph = FlowGraph::new();
        let mut positions = HashMap::with_capacity(actors.len());
        for actor in &actors {
            if positions.contains_key(&actor.id) {
                continue;
            }
            positions.insert(actor.id, graph.add_actor(ActorNode::from(actor))?);
        }

        // 2. One edge per flow; stocks loop back onto their origin
        for flow in flows.iter().chain(&stocks) {
            if !flow.amount.is_finite() || flow.amount < 0.0 {
                return Err(FlowGraphError::invalid_flow(flow.id, format!("invalid amount {}", flow.amount)));
            }
            let source = positions.get(&flow.origin).copied();
            let target = if flow.to_stock {
                source
            } else {
                flow.destination.and_then(|d| positions.get(&d).copied())
            };
            let (Some(source), Some(target)) = (source, target) else {
                warn!(flow_id = flow.id, origin = flow.origin, destination = ?flow.destination, "flow references an unknown actor, skipped");
                continue;
            };
            graph.add_flow(source, target, FlowEdge::new(flow.id, flow.material, flow.process, flow.amount))?;
        }

        Ok(graph)
    }
}
