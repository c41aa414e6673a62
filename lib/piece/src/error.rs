//! Error types for the piece crate.
//!
//! - `RegistryError`: A piece cannot be registered
//! - `ScheduleError`: Polling schedule options are malformed
//! - `HookError`: A trigger hook failed or answered with an unusable response

use crate::hook::HookType;
use std::fmt;

/// Errors from piece registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A piece with the same name is already registered.
    DuplicatePiece { piece_name: String },
    /// A piece declares two triggers with the same name.
    DuplicateTrigger {
        piece_name: String,
        trigger_name: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicatePiece { piece_name } => {
                write!(f, "piece already registered: {piece_name}")
            }
            Self::DuplicateTrigger {
                piece_name,
                trigger_name,
            } => write!(f, "piece '{piece_name}' declares trigger '{trigger_name}' twice"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Errors from schedule validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Invalid cron expression.
    InvalidCronExpression { expression: String, reason: String },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCronExpression { expression, reason } => {
                write!(f, "invalid cron expression '{expression}': {reason}")
            }
        }
    }
}

impl std::error::Error for ScheduleError {}

/// Errors from trigger hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// The hook raised an error.
    Failed { hook: HookType, reason: String },
    /// The hook did not finish in time.
    Timeout { hook: HookType },
    /// The hook answered with something that cannot be used.
    InvalidResponse { hook: HookType, reason: String },
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { hook, reason } => write!(f, "{hook} hook failed: {reason}"),
            Self::Timeout { hook } => write!(f, "{hook} hook timed out"),
            Self::InvalidResponse { hook, reason } => {
                write!(f, "{hook} hook returned an invalid response: {reason}")
            }
        }
    }
}

impl std::error::Error for HookError {}
