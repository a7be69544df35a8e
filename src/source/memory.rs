//! In-memory `FlowRecordSource`, used by the Python bindings and by tests.
use super::records::{ActorRecord, FlowRecord};
use super::{FlowRecordSource, KeyflowId};
use crate::error::{FlowGraphError, Result};
use crate::graph::ActorId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryFlowSource {
    /// Flows per keyflow. A keyflow present with an empty list is a known, empty scope.
    #[serde(default)]
    pub keyflows: BTreeMap<KeyflowId, Vec<FlowRecord>>,
    #[serde(default)]
    pub actors: BTreeMap<ActorId, ActorRecord>,
}

impl InMemoryFlowSource {
    pub fn new() -> Self { Self::default() }

    pub fn with_actor(mut self, actor: ActorRecord) -> Self {
        self.actors.insert(actor.id, actor);
        self
    }

    pub fn with_flow(mut self, keyflow: KeyflowId, flow: FlowRecord) -> Self {
        self.keyflows.entry(keyflow).or_default().push(flow);
        self
    }

    pub fn with_keyflow(mut self, keyflow: KeyflowId) -> Self {
        self.keyflows.entry(keyflow).or_default();
        self
    }
}

impl FlowRecordSource for InMemoryFlowSource {
    fn list_flows(&self, scope: KeyflowId, to_stock: bool) -> Result<Vec<FlowRecord>> {
        let flows = self
            .keyflows
            .get(&scope)
            .ok_or_else(|| FlowGraphError::NotFound(format!("keyflow {}", scope)))?;
        Ok(flows.iter().filter(|f| f.to_stock == to_stock).cloned().collect())
    }

    fn list_actors(&self, ids: &BTreeSet<ActorId>) -> Result<Vec<ActorRecord>> {
        Ok(ids.iter().filter_map(|id| self.actors.get(id)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_stock_and_non_stock_flows() {
        let src = InMemoryFlowSource::new()
            .with_flow(1, FlowRecord::between(1, 10, 11, 1, 2.0))
            .with_flow(1, FlowRecord::stock(2, 10, 1, 3.0));
        assert_eq!(src.list_flows(1, false).unwrap().len(), 1);
        assert_eq!(src.list_flows(1, true).unwrap()[0].id, 2);
        assert!(src.list_flows(2, false).unwrap_err().is_not_found());
    }

    #[test]
    fn test_deserializes_from_json() {
        let json = r#"{
            "keyflows": {"3": [{"id": 1, "origin": 5, "destination": 6, "material": 2, "amount": 1.5}]},
            "actors": {"5": {"id": 5, "name": "Farm"}, "6": {"id": 6, "name": "Mill", "activity": 8}}
        }"#;
        let src: InMemoryFlowSource = serde_json::from_str(json).unwrap();
        assert_eq!(src.list_flows(3, false).unwrap()[0].destination, Some(6));
        let actors = src.list_actors(&BTreeSet::from([6, 99])).unwrap();
        assert_eq!(actors.len(), 1);
        assert_eq!(actors[0].activity, Some(8));
    }
}
