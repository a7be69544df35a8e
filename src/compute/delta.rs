//! Amount deltas: the per-flow result of a strategy run as handed to the
//! external record store.
use crate::error::Result;
use crate::graph::{ActorId, FlowId, MaterialId, ProcessId};
use crate::solution::StrategyId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AmountDelta {
    /// A flow that exists only in the strategy graph.
    NewFlow {
        flow_id: FlowId,
        strategy_id: StrategyId,
        origin: ActorId,
        destination: ActorId,
        material: MaterialId,
        process: Option<ProcessId>,
        amount: f64,
    },
    /// Strategy amount of an existing baseline flow.
    Override {
        base_flow_id: FlowId,
        strategy_id: StrategyId,
        amount: f64,
        material: MaterialId,
    },
}

impl AmountDelta {
    pub fn strategy_id(&self) -> StrategyId {
        match self {
            Self::NewFlow { strategy_id, .. } | Self::Override { strategy_id, .. } => *strategy_id,
        }
    }

    pub fn amount(&self) -> f64 {
        match self {
            Self::NewFlow { amount, .. } | Self::Override { amount, .. } => *amount,
        }
    }

    /// Flow id in the strategy graph (the baseline id for overrides).
    pub fn flow_id(&self) -> FlowId {
        match self {
            Self::NewFlow { flow_id, .. } => *flow_id,
            Self::Override { base_flow_id, .. } => *base_flow_id,
        }
    }
}

/// Receiver of a strategy's deltas.
///
/// `replace_strategy_deltas` discards whatever is stored for the strategy and
/// stores `deltas` in its place. Implementations must apply it as one unit.
pub trait DeltaSink {
    fn replace_strategy_deltas(&mut self, strategy: StrategyId, deltas: &[AmountDelta]) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDeltaSink {
    committed: BTreeMap<StrategyId, Vec<AmountDelta>>,
}

impl MemoryDeltaSink {
    pub fn new() -> Self { Self::default() }

    pub fn deltas(&self, strategy: StrategyId) -> &[AmountDelta] {
        self.committed.get(&strategy).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl DeltaSink for MemoryDeltaSink {
    fn replace_strategy_deltas(&mut self, strategy: StrategyId, deltas: &[AmountDelta]) -> Result<()> {
        self.committed.insert(strategy, deltas.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_json_is_tagged() {
        let delta = AmountDelta::Override { base_flow_id: 7, strategy_id: 2, amount: 3.5, material: 1 };
        let json = serde_json::to_value(&delta).unwrap();
        assert_eq!(json["kind"], "override");
        assert_eq!(json["base_flow_id"], 7);
    }

    #[test]
    fn test_replace_discards_previous_deltas() {
        let mut sink = MemoryDeltaSink::new();
        let first = AmountDelta::Override { base_flow_id: 1, strategy_id: 9, amount: 1.0, material: 1 };
        let second = AmountDelta::Override { base_flow_id: 2, strategy_id: 9, amount: 2.0, material: 1 };
        sink.replace_strategy_deltas(9, &[first]).unwrap();
        sink.replace_strategy_deltas(9, &[second.clone()]).unwrap();
        assert_eq!(sink.deltas(9), &[second]);
        assert!(sink.deltas(10).is_empty());
    }
}
