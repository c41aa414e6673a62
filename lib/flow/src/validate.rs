//! Validation of flow graphs.
//!
//! Checks performed per step:
//! - Branch conditions follow their operator's operand rules
//! - Loop item expressions are non-empty
//! - Interpolated input values are well formed, as judged by an
//!   [`ExpressionResolver`]
//! - Piece and code steps reference what they run
//!
//! Graph-wide, step names must be unique across everything reachable from
//! the trigger.

use crate::action::{ActionKind, ActionNode};
use crate::error::ConditionError;
use crate::trigger::{Trigger, TriggerKind};
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::fmt;

const EXPRESSION_OPEN: &str = "{{";
const EXPRESSION_CLOSE: &str = "}}";

/// Decides whether an interpolation expression is well formed.
///
/// Only presence and shape are checked here; evaluating the expression is
/// the job of the run-time resolver.
pub trait ExpressionResolver: Send + Sync {
    /// Returns true if `value` contains only well-formed interpolations.
    fn is_well_formed(&self, value: &str) -> bool;
}

/// Accepts values whose `{{ ... }}` segments are closed and non-empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct BraceExpressionResolver;

impl ExpressionResolver for BraceExpressionResolver {
    fn is_well_formed(&self, value: &str) -> bool {
        let mut rest = value;
        while let Some(start) = rest.find(EXPRESSION_OPEN) {
            let after_open = &rest[start + EXPRESSION_OPEN.len()..];
            let Some(end) = after_open.find(EXPRESSION_CLOSE) else {
                return false;
            };
            let inner = &after_open[..end];
            if inner.trim().is_empty() || inner.contains(EXPRESSION_OPEN) {
                return false;
            }
            rest = &after_open[end + EXPRESSION_CLOSE.len()..];
        }
        true
    }
}

/// What is wrong with a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// Another reachable step already uses this name.
    DuplicateName,
    /// A branch condition is malformed.
    InvalidCondition {
        group: usize,
        index: usize,
        error: ConditionError,
    },
    /// A loop has no items expression.
    EmptyLoopItems,
    /// An input value holds a malformed interpolation.
    MalformedExpression { key: String },
    /// The step does not reference anything to run.
    Incomplete { reason: &'static str },
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName => write!(f, "duplicate step name"),
            Self::InvalidCondition {
                group,
                index,
                error,
            } => write!(f, "condition {group}.{index}: {error}"),
            Self::EmptyLoopItems => write!(f, "loop items expression is empty"),
            Self::MalformedExpression { key } => {
                write!(f, "input '{key}' has a malformed expression")
            }
            Self::Incomplete { reason } => write!(f, "incomplete step: {reason}"),
        }
    }
}

/// A validation finding attached to a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// The step the issue was found on.
    pub step: String,
    /// The issue.
    pub kind: IssueKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.kind)
    }
}

/// Every issue found while validating a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns whether no issues were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns the issues found on one step.
    pub fn issues_for<'a>(&'a self, step: &'a str) -> impl Iterator<Item = &'a IssueKind> + 'a {
        self.issues
            .iter()
            .filter(move |issue| issue.step == step)
            .map(|issue| &issue.kind)
    }
}

/// Returns the issues local to one step, ignoring its links.
#[must_use]
pub fn step_issues(node: &ActionNode, resolver: &dyn ExpressionResolver) -> Vec<IssueKind> {
    let mut issues = Vec::new();
    match &node.kind {
        ActionKind::Code { settings } => {
            if settings.artifact_ref().is_none() {
                issues.push(IssueKind::Incomplete {
                    reason: "code step has no artifact",
                });
            }
        }
        ActionKind::Piece { settings } => {
            if settings.action_name.as_deref().is_none_or(str::is_empty) {
                issues.push(IssueKind::Incomplete {
                    reason: "piece step has no action selected",
                });
            }
        }
        ActionKind::LoopOnItems { settings, .. } => {
            if settings.items.trim().is_empty() {
                issues.push(IssueKind::EmptyLoopItems);
            } else if !resolver.is_well_formed(&settings.items) {
                issues.push(IssueKind::MalformedExpression {
                    key: "items".to_string(),
                });
            }
        }
        ActionKind::Branch { settings, .. } => {
            for (group, conditions) in settings.conditions.iter().enumerate() {
                for (index, condition) in conditions.iter().enumerate() {
                    if let Err(error) = condition.validate() {
                        issues.push(IssueKind::InvalidCondition {
                            group,
                            index,
                            error,
                        });
                    } else if condition.operands().any(|v| !resolver.is_well_formed(v)) {
                        issues.push(IssueKind::MalformedExpression {
                            key: format!("conditions.{group}.{index}"),
                        });
                    }
                }
            }
        }
    }
    if let Some(input) = node.input() {
        for (key, value) in input {
            if !value_is_well_formed(value, resolver) {
                issues.push(IssueKind::MalformedExpression { key: key.clone() });
            }
        }
    }
    issues
}

/// Returns the issues of the trigger itself.
#[must_use]
pub fn trigger_issues(trigger: &Trigger, resolver: &dyn ExpressionResolver) -> Vec<IssueKind> {
    match &trigger.kind {
        TriggerKind::Empty => vec![IssueKind::Incomplete {
            reason: "no trigger selected",
        }],
        TriggerKind::Webhook => Vec::new(),
        TriggerKind::Piece { settings } => {
            let mut issues = Vec::new();
            if settings.trigger_name.is_empty() {
                issues.push(IssueKind::Incomplete {
                    reason: "piece trigger has no trigger selected",
                });
            }
            for (key, value) in &settings.input {
                if !value_is_well_formed(value, resolver) {
                    issues.push(IssueKind::MalformedExpression { key: key.clone() });
                }
            }
            issues
        }
    }
}

/// Validates the trigger and every reachable action.
#[must_use]
pub fn validate_trigger(trigger: &Trigger, resolver: &dyn ExpressionResolver) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(trigger.name.as_str());

    for kind in trigger_issues(trigger, resolver) {
        report.issues.push(ValidationIssue {
            step: trigger.name.clone(),
            kind,
        });
    }

    let actions = trigger.next().map(ActionNode::descendants).unwrap_or_default();
    for node in actions {
        if !seen.insert(node.name.as_str()) {
            report.issues.push(ValidationIssue {
                step: node.name.clone(),
                kind: IssueKind::DuplicateName,
            });
        }
        for kind in step_issues(node, resolver) {
            report.issues.push(ValidationIssue {
                step: node.name.clone(),
                kind,
            });
        }
    }
    report
}

fn value_is_well_formed(value: &JsonValue, resolver: &dyn ExpressionResolver) -> bool {
    match value {
        JsonValue::String(s) => !s.contains(EXPRESSION_OPEN) || resolver.is_well_formed(s),
        JsonValue::Array(items) => items.iter().all(|v| value_is_well_formed(v, resolver)),
        JsonValue::Object(map) => map.values().all(|v| value_is_well_formed(v, resolver)),
        JsonValue::Null | JsonValue::Bool(_) | JsonValue::Number(_) => true,
    }
}
