//! Strategy computation: formulas, the per-run change ledger, change
//! propagation and the strategy engine.
pub mod delta;
pub mod formula;
pub mod ledger;
pub mod propagation;
pub mod strategy;

pub use delta::{AmountDelta, DeltaSink, MemoryDeltaSink};
pub use formula::Formula;
pub use ledger::{BakedChanges, ChangeLedger};
pub use propagation::{ChangePropagationEngine, Direction, EdgeChangeMap, FlowView, Traversal};
pub use strategy::{StrategyGraphEngine, StrategyOutcome};
