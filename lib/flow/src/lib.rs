//! Flow action graph for pieceflow.
//!
//! This crate provides:
//!
//! - **Action Graph**: Code, piece, loop and branch steps owning their
//!   children, hanging off a trigger
//! - **Operations**: Single-step graph mutations with name and placement checks
//! - **Validation**: Condition, loop and expression checks with a full report
//! - **Storage**: The flow service seam and an in-memory implementation
//! - **Builder**: Materializes generated drafts into named, persisted flows

pub mod action;
pub mod builder;
pub mod condition;
pub mod error;
pub mod operation;
pub mod store;
pub mod trigger;
pub mod validate;
pub mod version;

pub use action::{ActionKind, ActionNode, ActionType, InputMap};
pub use builder::{DraftPlan, GraphBuilder, StepCounter};
pub use condition::{BranchOperator, Condition};
pub use error::{BuildError, ConditionError, FlowError, GraphError};
pub use operation::{FlowOperation, StepLocation};
pub use store::{CreateFlowRequest, FlowService, InMemoryFlowService};
pub use trigger::{PieceTriggerSettings, TRIGGER_NAME, Trigger, TriggerKind, TriggerType};
pub use validate::{BraceExpressionResolver, ExpressionResolver, ValidationReport};
pub use version::{Flow, FlowVersion, Step};
