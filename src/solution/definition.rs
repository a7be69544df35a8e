//! Strategy, solution and solution-part definitions as handed over by the
//! definition store.
use crate::graph::{ActivityId, MaterialId, ProcessId};
use crate::source::{ActorRecord, AreaId, KeyflowId};
use serde::{Deserialize, Serialize};

pub type StrategyId = i64;
pub type SolutionId = i64;
pub type PartId = i64;
pub type QuestionId = i64;

/// Filter selecting flows by activity pair, material family and process.
/// An unset field matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowReference {
    #[serde(default)]
    pub origin_activity: Option<ActivityId>,
    #[serde(default)]
    pub destination_activity: Option<ActivityId>,
    #[serde(default)]
    pub material: Option<MaterialId>,
    #[serde(default)]
    pub process: Option<ProcessId>,
}

/// Which side of an implementation flow must lie inside the implementation area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpatialApplication {
    #[default]
    None,
    Origin,
    Destination,
    Both,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionPart {
    pub id: PartId,
    #[serde(default)]
    pub priority: i32,
    pub implementation: FlowReference,
    #[serde(default)]
    pub spatial_application: SpatialApplication,
    #[serde(default)]
    pub affected_flows: Vec<FlowReference>,
    pub a: f64,
    pub b: f64,
    /// Question whose answer is the quantity fed into the formula.
    #[serde(default)]
    pub question: Option<QuestionId>,
    #[serde(default)]
    pub is_absolute: bool,
    #[serde(default)]
    pub implements_new_flow: bool,
    /// For new flows: keep the origin (redirect the destination) or the destination.
    #[serde(default = "default_keep_origin")]
    pub keep_origin: bool,
}

fn default_keep_origin() -> bool { true }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub id: SolutionId,
    #[serde(default)]
    pub name: String,
    pub parts: Vec<SolutionPart>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImplementationQuantity {
    pub question: QuestionId,
    pub value: f64,
}

/// Target actor chosen by the user for a new-flow solution part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickedActor {
    pub part: PartId,
    pub actor: ActorRecord,
}

/// A solution as implemented within one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionInStrategy {
    pub solution: Solution,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub implementation_area: Option<AreaId>,
    #[serde(default)]
    pub quantities: Vec<ImplementationQuantity>,
    #[serde(default)]
    pub picked_actors: Vec<PickedActor>,
}

impl SolutionInStrategy {
    pub fn quantity_for(&self, question: QuestionId) -> Option<f64> {
        self.quantities.iter().find(|q| q.question == question).map(|q| q.value)
    }

    pub fn picked_actor(&self, part: PartId) -> Option<&ActorRecord> {
        self.picked_actors.iter().find(|p| p.part == part).map(|p| &p.actor)
    }

    /// Parts in execution order (stable on equal priority).
    pub fn ordered_parts(&self) -> Vec<&SolutionPart> {
        let mut parts: Vec<&SolutionPart> = self.solution.parts.iter().collect();
        parts.sort_by_key(|p| p.priority);
        parts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: StrategyId,
    pub keyflow: KeyflowId,
    /// Tag of the baseline snapshot this strategy is computed against.
    #[serde(default)]
    pub tag: Option<String>,
    pub solutions: Vec<SolutionInStrategy>,
}

impl Strategy {
    /// Solutions in execution order (stable on equal priority).
    pub fn ordered_solutions(&self) -> Vec<&SolutionInStrategy> {
        let mut solutions: Vec<&SolutionInStrategy> = self.solutions.iter().collect();
        solutions.sort_by_key(|s| s.priority);
        solutions
    }
}
