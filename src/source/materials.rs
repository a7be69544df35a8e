//! Material hierarchy: transitive closure over a parent -> children index.
use super::MaterialHierarchy;
use crate::graph::MaterialId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Precomputed parent -> children index of the material tree.
#[derive(Debug, Clone, Default)]
pub struct MaterialTree {
    children: HashMap<MaterialId, Vec<MaterialId>>,
}

/// One `(id, parent)` row as stored by the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRow {
    pub id: MaterialId,
    #[serde(default)]
    pub parent: Option<MaterialId>,
}

impl MaterialTree {
    pub fn from_rows(rows: impl IntoIterator<Item = MaterialRow>) -> Self {
        let mut children: HashMap<MaterialId, Vec<MaterialId>> = HashMap::new();
        for row in rows {
            if let Some(parent) = row.parent {
                children.entry(parent).or_default().push(row.id);
            }
        }
        Self { children }
    }
}

impl MaterialHierarchy for MaterialTree {
    fn descendants(&self, material: MaterialId) -> BTreeSet<MaterialId> {
        let mut found = BTreeSet::new();
        let mut stack: Vec<MaterialId> = self.children.get(&material).cloned().unwrap_or_default();
        while let Some(m) = stack.pop() {
            // A malformed tree may loop back onto an ancestor.
            if m == material || !found.insert(m) {
                continue;
            }
            if let Some(kids) = self.children.get(&m) {
                stack.extend(kids.iter().copied());
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: MaterialId, parent: Option<MaterialId>) -> MaterialRow {
        MaterialRow { id, parent }
    }

    #[test]
    fn test_descendants_are_transitive() {
        // 1 -> {2, 3}, 3 -> {4}, 5 unrelated
        let tree = MaterialTree::from_rows([row(1, None), row(2, Some(1)), row(3, Some(1)), row(4, Some(3)), row(5, None)]);
        assert_eq!(tree.descendants(1), BTreeSet::from([2, 3, 4]));
        assert_eq!(tree.descendants(3), BTreeSet::from([4]));
        assert!(tree.descendants(5).is_empty());
        assert_eq!(tree.family(3), BTreeSet::from([3, 4]));
    }

    #[test]
    fn test_deep_hierarchy_does_not_recurse() {
        let rows = (1..100_000).map(|i| row(i, Some(i - 1)));
        let tree = MaterialTree::from_rows(rows);
        assert_eq!(tree.descendants(0).len(), 99_999);
    }

    #[test]
    fn test_cycle_terminates() {
        let tree = MaterialTree::from_rows([row(1, Some(2)), row(2, Some(1)), row(3, Some(2))]);
        assert_eq!(tree.descendants(1), BTreeSet::from([2, 3]));
    }
}
