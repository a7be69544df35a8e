//! Solutions, their ordered parts, and the strategies combining them.
pub mod definition;
pub mod filter;

pub use definition::{
    FlowReference, ImplementationQuantity, PartId, PickedActor, QuestionId, Solution, SolutionId,
    SolutionInStrategy, SolutionPart, SpatialApplication, Strategy, StrategyId,
};
pub use filter::{select_flows, AreaFilter};
