//! Error types for the trigger crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `QueueError`: Errors from the execution queue
//! - `RoutingError`: Errors from the event-routing registrar
//! - `TriggerError`: Dispatch and lifecycle errors (wraps the above and
//!   hook errors via context)

use pieceflow_core::{FlowId, FlowVersionId};
use pieceflow_piece::HookType;
use std::fmt;

/// Errors from the execution queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The job's schedule is malformed.
    InvalidSchedule { job_id: FlowVersionId, reason: String },
    /// The queue backend is unavailable.
    Unavailable { reason: String },
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSchedule { job_id, reason } => {
                write!(f, "invalid schedule for job {job_id}: {reason}")
            }
            Self::Unavailable { reason } => write!(f, "execution queue unavailable: {reason}"),
        }
    }
}

impl std::error::Error for QueueError {}

/// Errors from event routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// The routing backend is unavailable.
    Unavailable { reason: String },
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => write!(f, "event routing unavailable: {reason}"),
        }
    }
}

impl std::error::Error for RoutingError {}

/// Errors from trigger dispatch and lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerError {
    /// The registry has no piece with this name.
    PieceNotFound {
        piece_name: String,
        piece_version: String,
    },
    /// The piece has no trigger with this name.
    TriggerNotFound {
        piece_name: String,
        piece_version: String,
        trigger_name: String,
    },
    /// A `RUN` hook failed; only ever logged by dispatch.
    RunFailed {
        piece_name: String,
        piece_version: String,
        trigger_name: String,
    },
    /// An `ON_ENABLE` or `ON_DISABLE` hook failed (use as context wrapper).
    HookFailed { hook: HookType },
    /// A polling trigger enabled without returning a schedule.
    MissingScheduleOptions { flow_version_id: FlowVersionId },
    /// App-webhook listeners could not be registered (use as context wrapper).
    ListenerRegistrationFailed { flow_id: FlowId, app_name: String },
    /// App-webhook listeners could not be removed (use as context wrapper).
    ListenerRemovalFailed { flow_id: FlowId },
    /// The polling job could not be added (use as context wrapper).
    JobSchedulingFailed { flow_version_id: FlowVersionId },
    /// The polling job could not be removed (use as context wrapper).
    JobRemovalFailed { flow_version_id: FlowVersionId },
}

impl fmt::Display for TriggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PieceNotFound {
                piece_name,
                piece_version,
            } => write!(f, "piece not found: {piece_name}@{piece_version}"),
            Self::TriggerNotFound {
                piece_name,
                piece_version,
                trigger_name,
            } => write!(
                f,
                "trigger '{trigger_name}' not found in piece {piece_name}@{piece_version}"
            ),
            Self::RunFailed {
                piece_name,
                piece_version,
                trigger_name,
            } => write!(
                f,
                "trigger '{trigger_name}' of {piece_name}@{piece_version} failed to run"
            ),
            Self::HookFailed { hook } => write!(f, "{hook} hook failed"),
            Self::MissingScheduleOptions { flow_version_id } => write!(
                f,
                "polling trigger of flow version {flow_version_id} returned no schedule"
            ),
            Self::ListenerRegistrationFailed { flow_id, app_name } => {
                write!(f, "failed to register '{app_name}' listeners for flow {flow_id}")
            }
            Self::ListenerRemovalFailed { flow_id } => {
                write!(f, "failed to remove listeners for flow {flow_id}")
            }
            Self::JobSchedulingFailed { flow_version_id } => {
                write!(f, "failed to schedule polling job {flow_version_id}")
            }
            Self::JobRemovalFailed { flow_version_id } => {
                write!(f, "failed to remove polling job {flow_version_id}")
            }
        }
    }
}

impl std::error::Error for TriggerError {}
