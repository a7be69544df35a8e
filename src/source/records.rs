//! Flow and actor records as delivered by the canonical record store.
use crate::graph::{ActivityId, ActorId, ActorNode, FlowId, MaterialId, ProcessId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub id: FlowId,
    pub origin: ActorId,
    /// `None` for flows into a stock.
    #[serde(default)]
    pub destination: Option<ActorId>,
    pub material: MaterialId,
    #[serde(default)]
    pub process: Option<ProcessId>,
    pub amount: f64,
    #[serde(default)]
    pub to_stock: bool,
}

impl FlowRecord {
    pub fn between(id: FlowId, origin: ActorId, destination: ActorId, material: MaterialId, amount: f64) -> Self {
        Self { id, origin, destination: Some(destination), material, process: None, amount, to_stock: false }
    }

    pub fn stock(id: FlowId, origin: ActorId, material: MaterialId, amount: f64) -> Self {
        Self { id, origin, destination: None, material, process: None, amount, to_stock: true }
    }

    pub fn with_process(mut self, process: ProcessId) -> Self {
        self.process = Some(process);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorRecord {
    pub id: ActorId,
    pub name: String,
    #[serde(default)]
    pub external_code: String,
    #[serde(default)]
    pub activity: Option<ActivityId>,
}

impl ActorRecord {
    pub fn new(id: ActorId, name: impl Into<String>, activity: Option<ActivityId>) -> Self {
        Self { id, name: name.into(), external_code: String::new(), activity }
    }
}

impl From<&ActorRecord> for ActorNode {
    fn from(r: &ActorRecord) -> Self {
        ActorNode {
            actor_id: r.id,
            name: r.name.clone(),
            external_code: r.external_code.clone(),
            activity: r.activity,
        }
    }
}
