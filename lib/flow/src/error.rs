//! Error types for the flow crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `ConditionError`: A branch condition breaks its operand rules
//! - `GraphError`: A graph mutation cannot be applied
//! - `FlowError`: Flow persistence operations (wraps graph errors via context)
//! - `BuildError`: Draft materialization (wraps flow errors via context)

use crate::condition::BranchOperator;
use crate::operation::StepLocation;
use pieceflow_core::FlowId;
use std::fmt;

/// Errors from branch condition validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionError {
    /// The left operand is empty.
    EmptyFirstValue { operator: BranchOperator },
    /// A dual-operand operator has no right operand.
    MissingSecondValue { operator: BranchOperator },
}

impl fmt::Display for ConditionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFirstValue { operator } => {
                write!(f, "condition '{operator}' has an empty first value")
            }
            Self::MissingSecondValue { operator } => {
                write!(f, "condition '{operator}' requires a second value")
            }
        }
    }
}

impl std::error::Error for ConditionError {}

/// Errors from graph mutations.
///
/// These errors contain only information available at the graph layer.
/// Flow-level context (like flow_id) should be added by the caller
/// using `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// No step with the given name is reachable from the trigger.
    StepNotFound { name: String },
    /// A step with the given name already exists.
    DuplicateStepName { name: String },
    /// The parent step cannot hold a child at the requested location.
    InvalidLocation {
        parent_step: String,
        location: StepLocation,
    },
    /// The trigger cannot be removed or replaced by an action.
    TriggerNotMutable,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StepNotFound { name } => write!(f, "step not found: {name}"),
            Self::DuplicateStepName { name } => write!(f, "duplicate step name: {name}"),
            Self::InvalidLocation {
                parent_step,
                location,
            } => write!(f, "step '{parent_step}' cannot hold a child {location}"),
            Self::TriggerNotMutable => write!(f, "the trigger cannot be changed by this operation"),
        }
    }
}

impl std::error::Error for GraphError {}

/// Errors from flow persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// Flow not found.
    NotFound { flow_id: FlowId },
    /// A graph mutation was rejected (use as context wrapper).
    MutationRejected { flow_id: FlowId },
    /// The backing store failed.
    StorageFailed { reason: String },
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { flow_id } => write!(f, "flow not found: {flow_id}"),
            Self::MutationRejected { flow_id } => {
                write!(f, "graph mutation rejected for flow {flow_id}")
            }
            Self::StorageFailed { reason } => write!(f, "flow storage failed: {reason}"),
        }
    }
}

impl std::error::Error for FlowError {}

/// Errors from draft materialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The empty flow could not be created; nothing was persisted.
    FlowCreation,
    /// A mutation failed after the flow was created.
    ///
    /// Mutations are not transactional: the flow keeps the trigger (if it
    /// was set) and the first `applied` of `total` planned actions.
    PartialGraphMutation {
        flow_id: FlowId,
        applied: usize,
        total: usize,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FlowCreation => write!(f, "failed to create flow for draft"),
            Self::PartialGraphMutation {
                flow_id,
                applied,
                total,
            } => write!(
                f,
                "materialization of flow {flow_id} stopped after {applied} of {total} actions"
            ),
        }
    }
}

impl std::error::Error for BuildError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_error_display() {
        let err = ConditionError::MissingSecondValue {
            operator: BranchOperator::NumberIsGreaterThan,
        };
        assert!(err.to_string().contains("NUMBER_IS_GREATER_THAN"));
    }

    #[test]
    fn graph_error_invalid_location_display() {
        let err = GraphError::InvalidLocation {
            parent_step: "step-1".to_string(),
            location: StepLocation::InsideLoop,
        };
        assert_eq!(err.to_string(), "step 'step-1' cannot hold a child inside loop");
    }

    #[test]
    fn partial_mutation_display() {
        let flow_id = FlowId::new();
        let err = BuildError::PartialGraphMutation {
            flow_id,
            applied: 2,
            total: 5,
        };
        assert!(err.to_string().contains("after 2 of 5 actions"));
        assert!(err.to_string().contains(&flow_id.to_string()));
    }
}
