//! Result alias shared by the service layers.
//!
//! Crates keep their own error enums and return them wrapped in a
//! [`Report`], adding context with `.context(...)` at each boundary. Pure
//! graph operations return their error enums directly instead.

use rootcause::Report;

/// A result whose error is a report with context `C`.
pub type Result<T, C> = std::result::Result<T, Report<C>>;
