//! Material-flow graph engine: baseline graph construction, strategy
//! application and breadth-first change propagation.

pub mod compute;
pub mod config;
pub mod error;
pub mod graph;
pub mod solution;
pub mod source;
pub mod store;
pub mod telemetry;

#[cfg(feature = "python")]
pub mod bindings;

pub use compute::{AmountDelta, ChangePropagationEngine, DeltaSink, StrategyGraphEngine, StrategyOutcome};
pub use config::EngineConfig;
pub use error::{FlowGraphError, Result};
pub use graph::{FlowGraph, FlowGraphBuilder};
pub use store::{FileGraphStore, GraphStore, MemoryGraphStore, SnapshotKey};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Defines the `flowgraph._core` Python module.
#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    bindings::python::register(m)
}
