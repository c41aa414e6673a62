//! Branch conditions.
//!
//! A branch holds an ordered list of condition groups. Conditions inside a
//! group are AND-ed, groups are OR-ed. Whether a condition needs a second
//! operand depends on its operator, so that rule is checked by
//! [`Condition::validate`] rather than encoded in the type.

use crate::error::ConditionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator of a branch condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BranchOperator {
    TextContains,
    TextDoesNotContain,
    TextExactlyMatches,
    TextDoesNotExactlyMatch,
    #[serde(rename = "TEXT_START_WITH")]
    TextStartsWith,
    TextDoesNotStartWith,
    TextEndsWith,
    TextDoesNotEndWith,
    NumberIsGreaterThan,
    NumberIsLessThan,
    BooleanIsTrue,
    BooleanIsFalse,
    Exists,
    DoesNotExist,
}

impl BranchOperator {
    /// Returns true if the operator only inspects `firstValue`.
    #[must_use]
    pub fn is_single_operand(self) -> bool {
        matches!(
            self,
            Self::Exists | Self::DoesNotExist | Self::BooleanIsTrue | Self::BooleanIsFalse
        )
    }

    /// Returns the wire name of the operator.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TextContains => "TEXT_CONTAINS",
            Self::TextDoesNotContain => "TEXT_DOES_NOT_CONTAIN",
            Self::TextExactlyMatches => "TEXT_EXACTLY_MATCHES",
            Self::TextDoesNotExactlyMatch => "TEXT_DOES_NOT_EXACTLY_MATCH",
            Self::TextStartsWith => "TEXT_START_WITH",
            Self::TextDoesNotStartWith => "TEXT_DOES_NOT_START_WITH",
            Self::TextEndsWith => "TEXT_ENDS_WITH",
            Self::TextDoesNotEndWith => "TEXT_DOES_NOT_END_WITH",
            Self::NumberIsGreaterThan => "NUMBER_IS_GREATER_THAN",
            Self::NumberIsLessThan => "NUMBER_IS_LESS_THAN",
            Self::BooleanIsTrue => "BOOLEAN_IS_TRUE",
            Self::BooleanIsFalse => "BOOLEAN_IS_FALSE",
            Self::Exists => "EXISTS",
            Self::DoesNotExist => "DOES_NOT_EXIST",
        }
    }
}

impl fmt::Display for BranchOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single branch condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Left operand, usually an interpolation expression.
    pub first_value: String,
    /// Right operand; only meaningful for dual-operand operators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_value: Option<String>,
    /// The comparison to perform.
    pub operator: BranchOperator,
}

impl Condition {
    /// Creates a single-operand condition.
    #[must_use]
    pub fn unary(first_value: impl Into<String>, operator: BranchOperator) -> Self {
        Self {
            first_value: first_value.into(),
            second_value: None,
            operator,
        }
    }

    /// Creates a dual-operand condition.
    #[must_use]
    pub fn binary(
        first_value: impl Into<String>,
        operator: BranchOperator,
        second_value: impl Into<String>,
    ) -> Self {
        Self {
            first_value: first_value.into(),
            second_value: Some(second_value.into()),
            operator,
        }
    }

    /// Checks the operand rules for this condition's operator.
    ///
    /// A single-operand operator ignores `secondValue`; a leftover value is
    /// accepted, not rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if `firstValue` is empty, or if a dual-operand
    /// operator has no (or an empty) `secondValue`.
    pub fn validate(&self) -> Result<(), ConditionError> {
        if self.first_value.is_empty() {
            return Err(ConditionError::EmptyFirstValue {
                operator: self.operator,
            });
        }
        if self.operator.is_single_operand() {
            return Ok(());
        }
        match self.second_value.as_deref() {
            Some(value) if !value.is_empty() => Ok(()),
            _ => Err(ConditionError::MissingSecondValue {
                operator: self.operator,
            }),
        }
    }

    /// Iterates over the operands present on this condition.
    pub fn operands(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.first_value.as_str()).chain(self.second_value.as_deref())
    }
}
