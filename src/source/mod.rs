//! Interfaces to the collaborators that own the canonical data: flow records,
//! the material hierarchy and spatial filtering.
pub mod materials;
pub mod memory;
pub mod records;
pub mod spatial;

pub use materials::{MaterialRow, MaterialTree};
pub use memory::InMemoryFlowSource;
pub use records::{ActorRecord, FlowRecord};
pub use spatial::StaticAreaResolver;

use crate::error::Result;
use crate::graph::{ActorId, MaterialId};
use std::collections::BTreeSet;

/// Dataset partition (keyflow) a graph is built against.
pub type KeyflowId = i64;
pub type AreaId = i64;

/// Read-only provider of flow and actor records.
pub trait FlowRecordSource {
    /// Flows of `scope` whose `to_stock` flag equals `to_stock`.
    /// Fails with `NotFound` when the scope itself is unknown.
    fn list_flows(&self, scope: KeyflowId, to_stock: bool) -> Result<Vec<FlowRecord>>;

    /// Actor records for the given ids. Unknown ids are silently absent.
    fn list_actors(&self, ids: &BTreeSet<ActorId>) -> Result<Vec<ActorRecord>>;
}

pub trait MaterialHierarchy {
    /// All materials below `material`, excluding `material` itself.
    fn descendants(&self, material: MaterialId) -> BTreeSet<MaterialId>;

    /// `material` together with all of its descendants.
    fn family(&self, material: MaterialId) -> BTreeSet<MaterialId> {
        let mut family = self.descendants(material);
        family.insert(material);
        family
    }
}

pub trait SpatialActorResolver {
    fn actors_in_area(&self, keyflow: KeyflowId, area: AreaId) -> Result<BTreeSet<ActorId>>;
}
