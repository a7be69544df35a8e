//! Defines the core data structures of the material-flow network.
pub mod builder;
pub mod edge;
pub mod network;
pub mod node;
pub mod validation;

// Re-export key types for convenient access
pub use builder::FlowGraphBuilder;
pub use edge::{FlowEdge, FlowId, MaterialId, ProcessId, NO_PROCESS};
pub use network::{EdgeRow, FlowGraph, FlowSummary, GraphTables};
pub use node::{ActivityId, ActorId, ActorNode};
pub use validation::{validate, ValidityReport};

pub use petgraph::graph::{EdgeIndex, NodeIndex};
