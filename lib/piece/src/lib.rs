//! Piece contracts for pieceflow.
//!
//! This crate provides:
//!
//! - **Metadata**: Pieces with their trigger and action definitions
//! - **Registry**: Lookup of pieces by name
//! - **Hooks**: The request/response contract for trigger hooks
//! - **Schedules**: Polling schedule options returned by hooks

pub mod error;
pub mod hook;
pub mod piece;
pub mod registry;
pub mod schedule;

pub use error::{HookError, RegistryError, ScheduleError};
pub use hook::{HookInvoker, HookRequest, HookResponse, HookType, WebhookListener};
pub use piece::{ActionDefinition, Piece, TriggerDefinition, TriggerStrategy};
pub use registry::{PieceRegistry, StaticPieceRegistry};
pub use schedule::ScheduleOptions;
