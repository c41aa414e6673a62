//! Typed identifiers for flows, versions, projects and collections.
//!
//! Every id wraps a ULID. Ids display with a short entity prefix
//! (`flow_01H...`) and serialize as the bare ULID. Parsing accepts either
//! form but refuses a prefix that belongs to another entity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Why a string could not be read as an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseIdError {
    /// The string carries another entity's prefix.
    WrongPrefix {
        id_type: &'static str,
        expected: &'static str,
        found: String,
    },
    /// The ULID part is malformed.
    InvalidUlid { id_type: &'static str, reason: String },
}

impl ParseIdError {
    /// Name of the id type that failed to parse.
    #[must_use]
    pub fn id_type(&self) -> &'static str {
        match self {
            Self::WrongPrefix { id_type, .. } | Self::InvalidUlid { id_type, .. } => id_type,
        }
    }
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongPrefix {
                id_type,
                expected,
                found,
            } => write!(f, "{id_type} must be prefixed '{expected}_', found '{found}_'"),
            Self::InvalidUlid { id_type, reason } => write!(f, "invalid {id_type}: {reason}"),
        }
    }
}

impl std::error::Error for ParseIdError {}

fn parse_prefixed(
    s: &str,
    id_type: &'static str,
    expected: &'static str,
) -> Result<Ulid, ParseIdError> {
    let ulid = match s.split_once('_') {
        Some((prefix, rest)) if prefix == expected => rest,
        Some((prefix, _)) => {
            return Err(ParseIdError::WrongPrefix {
                id_type,
                expected,
                found: prefix.to_string(),
            });
        }
        None => s,
    };
    Ulid::from_str(ulid).map_err(|e| ParseIdError::InvalidUlid {
        id_type,
        reason: e.to_string(),
    })
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Generates a fresh id.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            /// The bare ULID, as used in URLs and serialized records.
            #[must_use]
            pub const fn as_ulid(&self) -> Ulid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_prefixed(s, stringify!($name), $prefix).map(Self)
            }
        }
    };
}

define_id!(
    /// Identifies a flow.
    FlowId,
    "flow"
);

define_id!(
    /// Identifies one version of a flow.
    FlowVersionId,
    "fv"
);

define_id!(
    /// Identifies the project owning a flow.
    ProjectId,
    "proj"
);

define_id!(
    /// Identifies a collection grouping flows inside a project.
    CollectionId,
    "coll"
);
