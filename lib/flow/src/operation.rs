//! Graph mutation operations.
//!
//! A flow version's graph only changes through [`FlowOperation`]s applied
//! with [`FlowVersion::apply`]. Each operation is applied on its own; there
//! is no batching, so callers applying a sequence see every intermediate
//! state.

use crate::action::{ActionKind, ActionNode, remove_from_slot};
use crate::error::GraphError;
use crate::trigger::{TRIGGER_NAME, Trigger};
use crate::validate::{self, ExpressionResolver};
use crate::version::FlowVersion;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a new step is placed relative to its parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepLocation {
    /// Between the parent and the parent's current `next`.
    #[default]
    After,
    /// At the head of a branch's success chain.
    InsideTrueBranch,
    /// At the head of a branch's failure chain.
    InsideFalseBranch,
    /// At the head of a loop body.
    InsideLoop,
}

impl fmt::Display for StepLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::After => "after",
            Self::InsideTrueBranch => "inside true branch",
            Self::InsideFalseBranch => "inside false branch",
            Self::InsideLoop => "inside loop",
        })
    }
}

/// A single mutation of a flow version's graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "request",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum FlowOperation {
    /// Replaces the trigger, keeping the action chain it owns.
    UpdateTrigger(Trigger),
    /// Inserts one step relative to an existing step.
    AddAction {
        parent_step: String,
        #[serde(default)]
        location: StepLocation,
        action: ActionNode,
    },
    /// Replaces a step's settings, keeping its links.
    UpdateAction(ActionNode),
    /// Removes a step, splicing its `next` into its place.
    DeleteAction { name: String },
}

impl FlowOperation {
    /// Returns the step name the operation targets.
    #[must_use]
    pub fn step_name(&self) -> &str {
        match self {
            Self::UpdateTrigger(_) => TRIGGER_NAME,
            Self::AddAction { action, .. } | Self::UpdateAction(action) => &action.name,
            Self::DeleteAction { name } => name,
        }
    }
}

impl FlowVersion {
    /// Applies one mutation and refreshes validity.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation references an unknown step, places a
    /// step where its parent cannot hold one, or reuses a step name. The
    /// version is left unchanged on error.
    pub fn apply(
        &mut self,
        operation: FlowOperation,
        resolver: &dyn ExpressionResolver,
    ) -> Result<(), GraphError> {
        match operation {
            FlowOperation::UpdateTrigger(trigger) => {
                update_trigger(&mut self.trigger, trigger, resolver);
            }
            FlowOperation::AddAction {
                parent_step,
                location,
                action,
            } => {
                if self.contains_step(&action.name) {
                    return Err(GraphError::DuplicateStepName { name: action.name });
                }
                add_action(&mut self.trigger, &parent_step, location, action, resolver)?;
            }
            FlowOperation::UpdateAction(action) => {
                update_action(&mut self.trigger, action, resolver)?;
            }
            FlowOperation::DeleteAction { name } => {
                if name == self.trigger.name {
                    return Err(GraphError::TriggerNotMutable);
                }
                remove_from_slot(&mut self.trigger.next_action, &name)
                    .ok_or(GraphError::StepNotFound { name })?;
            }
        }
        self.valid = validate::validate_trigger(&self.trigger, resolver).is_valid();
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn update_trigger(current: &mut Trigger, replacement: Trigger, resolver: &dyn ExpressionResolver) {
    let mut trigger = replacement.detached();
    trigger.name = TRIGGER_NAME.to_string();
    trigger.next_action = current.next_action.take();
    trigger.valid = validate::trigger_issues(&trigger, resolver).is_empty();
    *current = trigger;
}

fn add_action(
    trigger: &mut Trigger,
    parent_step: &str,
    location: StepLocation,
    action: ActionNode,
    resolver: &dyn ExpressionResolver,
) -> Result<(), GraphError> {
    let slot = if parent_step == trigger.name {
        if location != StepLocation::After {
            return Err(GraphError::InvalidLocation {
                parent_step: parent_step.to_string(),
                location,
            });
        }
        &mut trigger.next_action
    } else {
        let parent = trigger
            .next_action
            .as_deref_mut()
            .and_then(|head| head.find_mut(parent_step))
            .ok_or_else(|| GraphError::StepNotFound {
                name: parent_step.to_string(),
            })?;
        slot_at(parent, location)?
    };

    let mut node = Box::new(action.detached());
    node.valid = validate::step_issues(&node, resolver).is_empty();
    node.next_action = slot.take();
    *slot = Some(node);
    Ok(())
}

fn slot_at(
    parent: &mut ActionNode,
    location: StepLocation,
) -> Result<&mut Option<Box<ActionNode>>, GraphError> {
    let ActionNode {
        name,
        kind,
        next_action,
        ..
    } = parent;
    match (location, kind) {
        (StepLocation::After, _) => Ok(next_action),
        (
            StepLocation::InsideTrueBranch,
            ActionKind::Branch {
                on_success_action, ..
            },
        ) => Ok(on_success_action),
        (
            StepLocation::InsideFalseBranch,
            ActionKind::Branch {
                on_failure_action, ..
            },
        ) => Ok(on_failure_action),
        (
            StepLocation::InsideLoop,
            ActionKind::LoopOnItems {
                first_loop_action, ..
            },
        ) => Ok(first_loop_action),
        _ => Err(GraphError::InvalidLocation {
            parent_step: name.clone(),
            location,
        }),
    }
}

fn update_action(
    trigger: &mut Trigger,
    action: ActionNode,
    resolver: &dyn ExpressionResolver,
) -> Result<(), GraphError> {
    let target = trigger
        .next_action
        .as_deref_mut()
        .and_then(|head| head.find_mut(&action.name))
        .ok_or_else(|| GraphError::StepNotFound {
            name: action.name.clone(),
        })?;

    let mut replacement = action.detached();
    replacement.next_action = target.next_action.take();
    match (&mut replacement.kind, &mut target.kind) {
        (
            ActionKind::LoopOnItems {
                first_loop_action: body,
                ..
            },
            ActionKind::LoopOnItems {
                first_loop_action: old_body,
                ..
            },
        ) => *body = old_body.take(),
        (
            ActionKind::Branch {
                on_success_action: success,
                on_failure_action: failure,
                ..
            },
            ActionKind::Branch {
                on_success_action: old_success,
                on_failure_action: old_failure,
                ..
            },
        ) => {
            *success = old_success.take();
            *failure = old_failure.take();
        }
        _ => {}
    }
    replacement.valid = validate::step_issues(&replacement, resolver).is_empty();
    *target = replacement;
    Ok(())
}
