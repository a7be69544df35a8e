//! Defines the `ActorNode`, representing one actor of the material-flow network.

use serde::{Deserialize, Serialize};

/// External (database) identifier of an actor.
pub type ActorId = i64;

/// External identifier of an economic activity an actor belongs to.
pub type ActivityId = i64;

/// A vertex of the flow graph.
///
/// Nodes are created during the baseline build from the actor set referenced by
/// flows, or appended while applying a solution part that redirects flow to an
/// actor absent from the baseline. Their position in the graph may differ between
/// snapshots; `actor_id` never does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorNode {
    pub actor_id: ActorId,
    pub name: String,
    /// Secondary business identifier (e.g. a company register code).
    pub external_code: String,
    pub activity: Option<ActivityId>,
}

impl ActorNode {
    pub fn new(actor_id: ActorId, name: impl Into<String>) -> Self {
        Self { actor_id, name: name.into(), external_code: String::new(), activity: None }
    }

    pub fn with_activity(mut self, activity: ActivityId) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn with_external_code(mut self, code: impl Into<String>) -> Self {
        self.external_code = code.into();
        self
    }
}
