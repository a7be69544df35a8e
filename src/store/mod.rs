//! Persistence of named graph snapshots (baseline and per-strategy).
pub mod file;
pub mod memory;

pub use file::FileGraphStore;
pub use memory::MemoryGraphStore;

use crate::error::{FlowGraphError, Result};
use crate::graph::FlowGraph;
use crate::solution::StrategyId;
use crate::source::KeyflowId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SnapshotVariant {
    Base,
    Strategy(StrategyId),
}

/// Identifies one snapshot: dataset scope, optional tag, variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotKey {
    pub keyflow: KeyflowId,
    pub tag: Option<String>,
    pub variant: SnapshotVariant,
}

impl SnapshotKey {
    pub fn base(keyflow: KeyflowId, tag: Option<&str>) -> Self {
        Self { keyflow, tag: tag.map(str::to_owned), variant: SnapshotVariant::Base }
    }

    pub fn strategy(keyflow: KeyflowId, tag: Option<&str>, strategy: StrategyId) -> Self {
        Self { keyflow, tag: tag.map(str::to_owned), variant: SnapshotVariant::Strategy(strategy) }
    }

    /// Rejects tags that would not stay a single file name component.
    pub fn validate(&self) -> Result<()> {
        match self.tag.as_deref() {
            Some(tag) if tag.is_empty() || tag.contains(['/', '\\', '\0']) || tag.contains("..") => {
                Err(FlowGraphError::Storage(format!("invalid snapshot tag {:?}", tag)))
            }
            _ => Ok(()),
        }
    }

    /// File name of the snapshot, e.g. `keyflow-3-base.json` or `keyflow-3-test-s12.json`.
    pub fn file_name(&self) -> String {
        let tag = self.tag.as_deref().map(|t| format!("-{}", t)).unwrap_or_default();
        match self.variant {
            SnapshotVariant::Base => format!("keyflow-{}{}-base.json", self.keyflow, tag),
            SnapshotVariant::Strategy(s) => format!("keyflow-{}{}-s{}.json", self.keyflow, tag, s),
        }
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Store of serialized graph snapshots.
///
/// `load` always returns a fresh copy; mutating it never touches the stored
/// snapshot until `save` is called. Concurrent saves to one key are not
/// serialized by the store.
pub trait GraphStore {
    fn exists(&self, key: &SnapshotKey) -> bool;
    /// Fails with `NotFound` when no snapshot is stored under `key`.
    fn load(&self, key: &SnapshotKey) -> Result<FlowGraph>;
    fn save(&self, key: &SnapshotKey, graph: &FlowGraph) -> Result<()>;
    /// Removing an absent snapshot is not an error.
    fn remove(&self, key: &SnapshotKey) -> Result<()>;
    fn last_modified(&self, key: &SnapshotKey) -> Result<Option<DateTime<Utc>>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SnapshotKey::base(3, None), "keyflow-3-base.json")]
    #[case(SnapshotKey::base(3, Some("unittest")), "keyflow-3-unittest-base.json")]
    #[case(SnapshotKey::strategy(3, None, 12), "keyflow-3-s12.json")]
    #[case(SnapshotKey::strategy(3, Some("t"), 12), "keyflow-3-t-s12.json")]
    fn test_snapshot_file_names(#[case] key: SnapshotKey, #[case] expected: &str) {
        assert_eq!(key.file_name(), expected);
    }

    #[rstest]
    #[case("../x")]
    #[case("a/b")]
    #[case("a\\b")]
    #[case("..")]
    #[case("")]
    fn test_tags_escaping_the_root_are_rejected(#[case] tag: &str) {
        let err = SnapshotKey::base(3, Some(tag)).validate().unwrap_err();
        assert!(matches!(err, FlowGraphError::Storage(_)));
    }

    #[test]
    fn test_plain_tags_are_accepted() {
        assert!(SnapshotKey::base(3, None).validate().is_ok());
        assert!(SnapshotKey::strategy(3, Some("unit-test_2.v1"), 4).validate().is_ok());
    }
}
