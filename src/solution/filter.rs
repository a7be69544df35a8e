//! Resolves flow references to edge sets of a working graph.
use super::definition::{FlowReference, SpatialApplication};
use crate::graph::{ActorId, EdgeIndex, FlowGraph, MaterialId};
use crate::source::MaterialHierarchy;
use std::collections::BTreeSet;

/// Actors inside an implementation area and the side(s) they constrain.
#[derive(Debug, Clone, Copy)]
pub struct AreaFilter<'a> {
    pub actors: &'a BTreeSet<ActorId>,
    pub side: SpatialApplication,
}

impl AreaFilter<'_> {
    fn admits(&self, origin: ActorId, destination: ActorId) -> bool {
        match self.side {
            SpatialApplication::None => true,
            SpatialApplication::Origin => self.actors.contains(&origin),
            SpatialApplication::Destination => self.actors.contains(&destination),
            SpatialApplication::Both => self.actors.contains(&origin) && self.actors.contains(&destination),
        }
    }
}

/// Edges matching `reference`, in edge-position order.
pub fn select_flows(
    graph: &FlowGraph,
    reference: &FlowReference,
    materials: &dyn MaterialHierarchy,
    area: Option<AreaFilter<'_>>,
) -> Vec<EdgeIndex> {
    let family: Option<BTreeSet<MaterialId>> = reference.material.map(|m| materials.family(m));

    graph
        .edge_indices()
        .filter(|&e| {
            let (s, t) = graph.endpoints(e);
            let (origin, destination) = (graph.actor(s), graph.actor(t));
            let flow = graph.flow(e);

            let activity_ok = reference.origin_activity.map_or(true, |a| origin.activity == Some(a))
                && reference.destination_activity.map_or(true, |a| destination.activity == Some(a));
            let material_ok = family.as_ref().map_or(true, |f| f.contains(&flow.material));
            let process_ok = reference.process.map_or(true, |p| flow.process() == Some(p));
            let area_ok = area.map_or(true, |f| f.admits(origin.actor_id, destination.actor_id));

            activity_ok && material_ok && process_ok && area_ok
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ActorNode, FlowEdge};
    use crate::source::{MaterialRow, MaterialTree};

    // households(1) -> collection(2) -> treatment(3)
    fn graph() -> FlowGraph {
        let mut g = FlowGraph::new();
        let h1 = g.add_actor(ActorNode::new(1, "H1").with_activity(1)).unwrap();
        let h2 = g.add_actor(ActorNode::new(2, "H2").with_activity(1)).unwrap();
        let c = g.add_actor(ActorNode::new(3, "C").with_activity(2)).unwrap();
        let t = g.add_actor(ActorNode::new(4, "T").with_activity(3)).unwrap();
        g.add_flow(h1, c, FlowEdge::new(10, 100, None, 4.0)).unwrap();
        g.add_flow(h2, c, FlowEdge::new(11, 101, None, 6.0)).unwrap();
        g.add_flow(h2, c, FlowEdge::new(12, 200, None, 1.0)).unwrap();
        g.add_flow(c, t, FlowEdge::new(13, 100, Some(7), 9.0)).unwrap();
        g
    }

    fn materials() -> MaterialTree {
        // 100 (food waste) has child 101 (peels); 200 unrelated
        MaterialTree::from_rows([
            MaterialRow { id: 100, parent: None },
            MaterialRow { id: 101, parent: Some(100) },
            MaterialRow { id: 200, parent: None },
        ])
    }

    fn ids(g: &FlowGraph, edges: &[EdgeIndex]) -> Vec<i64> {
        edges.iter().map(|&e| g.flow(e).flow_id).collect()
    }

    #[test]
    fn test_matches_activity_pair_and_material_family() {
        let g = graph();
        let reference = FlowReference {
            origin_activity: Some(1),
            destination_activity: Some(2),
            material: Some(100),
            process: None,
        };
        assert_eq!(ids(&g, &select_flows(&g, &reference, &materials(), None)), vec![10, 11]);
    }

    #[test]
    fn test_process_filter() {
        let g = graph();
        let reference = FlowReference { process: Some(7), ..Default::default() };
        assert_eq!(ids(&g, &select_flows(&g, &reference, &materials(), None)), vec![13]);
    }

    #[test]
    fn test_area_narrows_origin_side() {
        let g = graph();
        let inside = BTreeSet::from([2]);
        let reference = FlowReference { destination_activity: Some(2), ..Default::default() };
        let area = AreaFilter { actors: &inside, side: SpatialApplication::Origin };
        assert_eq!(ids(&g, &select_flows(&g, &reference, &materials(), Some(area))), vec![11, 12]);

        let area = AreaFilter { actors: &inside, side: SpatialApplication::Both };
        assert!(select_flows(&g, &reference, &materials(), Some(area)).is_empty());
    }
}
