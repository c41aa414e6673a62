//! Core domain types shared across pieceflow crates.
//!
//! Holds the typed identifiers used by the flow model, the piece contracts
//! and the trigger lifecycle, and the report-based `Result` alias the
//! service layers return.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{CollectionId, FlowId, FlowVersionId, ParseIdError, ProjectId};
