//! Snapshot files on disk, one JSON document per key.
use super::{GraphStore, SnapshotKey};
use crate::error::{FlowGraphError, Result};
use crate::graph::{FlowGraph, GraphTables};
use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FileGraphStore {
    root: PathBuf,
}

impl FileGraphStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path { &self.root }

    /// Path of the snapshot file. Fails for keys whose tag is not a plain name.
    pub fn path_for(&self, key: &SnapshotKey) -> Result<PathBuf> {
        key.validate()?;
        Ok(self.root.join(key.file_name()))
    }
}

impl GraphStore for FileGraphStore {
    fn exists(&self, key: &SnapshotKey) -> bool {
        self.path_for(key).map(|p| p.is_file()).unwrap_or(false)
    }

    fn load(&self, key: &SnapshotKey) -> Result<FlowGraph> {
        let path = self.path_for(key)?;
        let file = File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FlowGraphError::NotFound(format!("graph snapshot {}", key)),
            _ => FlowGraphError::Io(e),
        })?;
        let tables: GraphTables = serde_json::from_reader(BufReader::new(file))?;
        let graph = FlowGraph::try_from(tables)?;
        debug!(snapshot = %key, nodes = graph.node_count(), edges = graph.edge_count(), "loaded graph snapshot");
        Ok(graph)
    }

    fn save(&self, key: &SnapshotKey, graph: &FlowGraph) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)?;

        // Write next to the target, then rename over it.
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, graph)?;
            writer.flush()?;
        }
        tmp.persist(&path).map_err(|e| FlowGraphError::Io(e.error))?;
        debug!(snapshot = %key, path = %path.display(), "saved graph snapshot");
        Ok(())
    }

    fn remove(&self, key: &SnapshotKey) -> Result<()> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn last_modified(&self, key: &SnapshotKey) -> Result<Option<DateTime<Utc>>> {
        match fs::metadata(self.path_for(key)?) {
            Ok(meta) => Ok(Some(DateTime::<Utc>::from(meta.modified()?))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ActorNode, FlowEdge};

    fn sample_graph() -> FlowGraph {
        let mut g = FlowGraph::new();
        let a = g.add_actor(ActorNode::new(1, "A")).unwrap();
        let b = g.add_actor(ActorNode::new(2, "B")).unwrap();
        g.add_flow(a, b, FlowEdge::new(100, 1, None, 10.0)).unwrap();
        g
    }

    #[test]
    fn test_save_load_remove_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGraphStore::new(dir.path().join("nested/graphs"));
        let key = SnapshotKey::base(1, Some("test"));

        assert!(!store.exists(&key));
        assert_eq!(store.last_modified(&key).unwrap(), None);
        assert!(store.load(&key).unwrap_err().is_not_found());

        store.save(&key, &sample_graph()).unwrap();
        assert!(store.exists(&key));
        assert!(store.last_modified(&key).unwrap().is_some());

        let loaded = store.load(&key).unwrap();
        assert_eq!(loaded.flow_summaries(), sample_graph().flow_summaries());

        store.remove(&key).unwrap();
        assert!(!store.exists(&key));
        store.remove(&key).unwrap();
    }

    #[test]
    fn test_loaded_copies_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGraphStore::new(dir.path());
        let key = SnapshotKey::base(1, None);
        store.save(&key, &sample_graph()).unwrap();

        let mut first = store.load(&key).unwrap();
        let e = first.edge_of(100).unwrap();
        first.set_amount(e, 99.0);

        let second = store.load(&key).unwrap();
        assert_eq!(second.amount(second.edge_of(100).unwrap()), 10.0);
    }

    #[test]
    fn test_tags_and_variants_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGraphStore::new(dir.path());
        store.save(&SnapshotKey::base(1, None), &sample_graph()).unwrap();
        assert!(!store.exists(&SnapshotKey::base(1, Some("other"))));
        assert!(!store.exists(&SnapshotKey::strategy(1, None, 1)));
    }

    #[test]
    fn test_tag_cannot_leave_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGraphStore::new(dir.path().join("graphs"));
        let key = SnapshotKey::base(1, Some("../escaped"));
        assert!(matches!(store.save(&key, &sample_graph()), Err(FlowGraphError::Storage(_))));
        assert!(!dir.path().join("graphs").exists());
        assert!(!store.exists(&key));
        assert!(store.load(&key).is_err());
    }

    #[test]
    fn test_corrupt_snapshot_with_duplicate_ids_is_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGraphStore::new(dir.path());
        let key = SnapshotKey::base(1, None);
        let json = r#"{"nodes":[{"actor_id":1,"name":"A","external_code":"","activity":null}],
            "edges":[{"source":0,"target":0,"flow":{"flow_id":5,"material":1,"process":-1,"amount":1.0}},
                     {"source":0,"target":0,"flow":{"flow_id":5,"material":1,"process":-1,"amount":2.0}}]}"#;
        fs::write(store.path_for(&key).unwrap(), json).unwrap();
        assert!(matches!(store.load(&key), Err(FlowGraphError::Conflict { flow_id: 5 })));
    }
}
