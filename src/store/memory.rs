//! In-process snapshot store. Snapshots are kept serialized so every load is a
//! fresh copy, exactly like the file store.
use super::{GraphStore, SnapshotKey};
use crate::error::{FlowGraphError, Result};
use crate::graph::{FlowGraph, GraphTables};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    entries: Mutex<HashMap<SnapshotKey, StoredSnapshot>>,
}

#[derive(Debug, Clone)]
struct StoredSnapshot {
    bytes: Vec<u8>,
    modified: DateTime<Utc>,
}

impl MemoryGraphStore {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize {
        self.entries().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<SnapshotKey, StoredSnapshot>>> {
        self.entries
            .lock()
            .map_err(|_| FlowGraphError::Storage("snapshot store lock poisoned".into()))
    }
}

impl GraphStore for MemoryGraphStore {
    fn exists(&self, key: &SnapshotKey) -> bool {
        self.entries().map(|e| e.contains_key(key)).unwrap_or(false)
    }

    fn load(&self, key: &SnapshotKey) -> Result<FlowGraph> {
        let bytes = self
            .entries()?
            .get(key)
            .map(|s| s.bytes.clone())
            .ok_or_else(|| FlowGraphError::NotFound(format!("graph snapshot {}", key)))?;
        let tables: GraphTables = serde_json::from_slice(&bytes)?;
        FlowGraph::try_from(tables)
    }

    fn save(&self, key: &SnapshotKey, graph: &FlowGraph) -> Result<()> {
        let bytes = serde_json::to_vec(graph)?;
        self.entries()?.insert(key.clone(), StoredSnapshot { bytes, modified: Utc::now() });
        Ok(())
    }

    fn remove(&self, key: &SnapshotKey) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn last_modified(&self, key: &SnapshotKey) -> Result<Option<DateTime<Utc>>> {
        Ok(self.entries()?.get(key).map(|s| s.modified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ActorNode, FlowEdge};

    #[test]
    fn test_load_is_unaliased_copy() {
        let store = MemoryGraphStore::new();
        let key = SnapshotKey::base(7, None);
        let mut g = FlowGraph::new();
        let a = g.add_actor(ActorNode::new(1, "A")).unwrap();
        g.add_flow(a, a, FlowEdge::new(1, 1, None, 2.0)).unwrap();
        store.save(&key, &g).unwrap();

        let mut copy = store.load(&key).unwrap();
        copy.set_amount(copy.edge_of(1).unwrap(), 0.0);
        let fresh = store.load(&key).unwrap();
        assert_eq!(fresh.amount(fresh.edge_of(1).unwrap()), 2.0);
        assert!(store.last_modified(&key).unwrap().is_some());

        store.remove(&key).unwrap();
        assert!(store.is_empty());
        assert!(store.load(&key).unwrap_err().is_not_found());
    }
}
