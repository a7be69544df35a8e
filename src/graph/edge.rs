//! Defines the `FlowEdge`, a directed quantity of material between two actors.

use serde::{Deserialize, Serialize};

/// Persistent flow identifier. Stable across re-indexing of the graph.
pub type FlowId = i64;
pub type MaterialId = i64;
pub type ProcessId = i64;

/// Sentinel stored in `FlowEdge::process` when a flow has no process.
pub const NO_PROCESS: i64 = -1;

/// Edge weight of the flow graph.
///
/// A stock (flow without destination) is stored as a self-loop on its origin.
/// Only `amount` changes after creation, and only when changes are baked into
/// a strategy snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub flow_id: FlowId,
    pub material: MaterialId,
    /// Process id, or `NO_PROCESS`.
    pub process: i64,
    pub amount: f64,
}

impl FlowEdge {
    pub fn new(flow_id: FlowId, material: MaterialId, process: Option<ProcessId>, amount: f64) -> Self {
        Self { flow_id, material, process: process.unwrap_or(NO_PROCESS), amount }
    }

    pub fn process(&self) -> Option<ProcessId> {
        (self.process != NO_PROCESS).then_some(self.process)
    }
}
