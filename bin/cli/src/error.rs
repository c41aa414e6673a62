//! Domain error types for CLI commands.

use std::fmt;
use std::path::PathBuf;

/// Errors from CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// Configuration could not be loaded.
    Config { details: String },
    /// An input file could not be read.
    ReadFailed { path: PathBuf },
    /// An input file is not valid JSON of the expected shape.
    ParseFailed { path: PathBuf },
    /// The draft could not be materialized.
    Materialize,
    /// A flow id argument is malformed.
    InvalidFlowId { value: String },
    /// Output could not be serialized.
    Output,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "invalid configuration: {details}"),
            Self::ReadFailed { path } => write!(f, "failed to read {}", path.display()),
            Self::ParseFailed { path } => write!(f, "failed to parse {}", path.display()),
            Self::Materialize => write!(f, "failed to materialize draft"),
            Self::InvalidFlowId { value } => write!(f, "invalid flow id: {value}"),
            Self::Output => write!(f, "failed to render output"),
        }
    }
}

impl std::error::Error for CliError {}
