//! Spatial actor resolution for implementation areas.
//!
//! The geometry itself lives outside this crate; resolvers only hand back the
//! actors located inside an area.
use super::{AreaId, KeyflowId, SpatialActorResolver};
use crate::error::{FlowGraphError, Result};
use crate::graph::ActorId;
use std::collections::{BTreeSet, HashMap};

/// Resolver over a precomputed area -> actors table.
#[derive(Debug, Clone, Default)]
pub struct StaticAreaResolver {
    areas: HashMap<AreaId, BTreeSet<ActorId>>,
}

impl StaticAreaResolver {
    pub fn new() -> Self { Self::default() }

    pub fn with_area(mut self, area: AreaId, actors: impl IntoIterator<Item = ActorId>) -> Self {
        self.areas.entry(area).or_default().extend(actors);
        self
    }
}

impl SpatialActorResolver for StaticAreaResolver {
    fn actors_in_area(&self, _keyflow: KeyflowId, area: AreaId) -> Result<BTreeSet<ActorId>> {
        self.areas
            .get(&area)
            .cloned()
            .ok_or_else(|| FlowGraphError::NotFound(format!("implementation area {}", area)))
    }
}
