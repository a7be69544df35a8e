//! Error taxonomy shared by every module of the crate.
use crate::graph::FlowId;
use crate::solution::PartId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowGraphError {
    /// Missing snapshot, dataset scope or other required record.
    #[error("Not found: {0}")]
    NotFound(String),
    /// Two edges of one graph carry the same flow id.
    #[error("Duplicate flow id {flow_id} in graph")]
    Conflict { flow_id: FlowId },
    #[error("Invalid state{}{}: {msg}", fmt_part(.part_id), fmt_flow(.flow_id))]
    InvalidState {
        part_id: Option<PartId>,
        flow_id: Option<FlowId>,
        msg: String,
    },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FlowGraphError>;

impl FlowGraphError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidState { part_id: None, flow_id: None, msg: msg.into() }
    }

    pub fn invalid_flow(flow_id: FlowId, msg: impl Into<String>) -> Self {
        Self::InvalidState { part_id: None, flow_id: Some(flow_id), msg: msg.into() }
    }

    /// Attaches the solution part to an `InvalidState` that does not name one yet.
    pub fn in_part(self, part: PartId) -> Self {
        match self {
            Self::InvalidState { part_id: None, flow_id, msg } => {
                Self::InvalidState { part_id: Some(part), flow_id, msg }
            }
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

fn fmt_part(part: &Option<PartId>) -> String {
    part.map(|p| format!(" in solution part {}", p)).unwrap_or_default()
}

fn fmt_flow(flow: &Option<FlowId>) -> String {
    flow.map(|f| format!(" (flow {})", f)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_message_names_part_and_flow() {
        let err = FlowGraphError::invalid_flow(42, "amount went negative").in_part(7);
        assert_eq!(
            err.to_string(),
            "Invalid state in solution part 7 (flow 42): amount went negative"
        );
    }

    #[test]
    fn test_in_part_keeps_existing_part() {
        let err = FlowGraphError::InvalidState { part_id: Some(1), flow_id: None, msg: "x".into() }.in_part(2);
        assert!(matches!(err, FlowGraphError::InvalidState { part_id: Some(1), .. }));
    }
}
