//! Action graph node types.
//!
//! Actions form a tree hanging off the flow's trigger:
//! - `next_action` links form the primary execution chain
//! - Loops own their body through `first_loop_action`
//! - Branches own their outcomes through `on_success_action` and
//!   `on_failure_action`
//!
//! Every link is an owned `Box`, so a node has exactly one parent and the
//! structure cannot contain cycles.

use crate::condition::Condition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Step input values keyed by property name.
pub type InputMap = Map<String, JsonValue>;

/// The discriminant of an action node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// Runs a user-authored code artifact.
    Code,
    /// Calls an action exposed by a piece.
    Piece,
    /// Repeats its body for every item of a list.
    LoopOnItems,
    /// Chooses between two sub-chains.
    Branch,
}

/// Settings of a code step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSettings {
    /// Reference to the stored source artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_source_id: Option<String>,
    /// Reference to the packaged (built) artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_packaged_id: Option<String>,
    /// Inline artifact, used while authoring before upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<String>,
    /// Values handed to the code at run time.
    #[serde(default)]
    pub input: InputMap,
}

impl CodeSettings {
    /// Returns the best available artifact reference.
    #[must_use]
    pub fn artifact_ref(&self) -> Option<&str> {
        self.artifact_packaged_id
            .as_deref()
            .or(self.artifact_source_id.as_deref())
            .or(self.artifact.as_deref())
    }
}

/// Settings of a piece step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceSettings {
    pub piece_name: String,
    pub piece_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_name: Option<String>,
    #[serde(default)]
    pub input: InputMap,
    /// Editor state for the inputs, opaque to the engine.
    #[serde(default)]
    pub input_ui_info: InputMap,
}

/// Settings of a loop step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopSettings {
    /// Expression producing the list to iterate.
    pub items: String,
}

/// Settings of a branch step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSettings {
    /// OR-ed groups of AND-ed conditions.
    #[serde(default)]
    pub conditions: Vec<Vec<Condition>>,
}

/// Variant-specific part of an action node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ActionKind {
    Code {
        settings: CodeSettings,
    },
    Piece {
        settings: PieceSettings,
    },
    LoopOnItems {
        settings: LoopSettings,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        first_loop_action: Option<Box<ActionNode>>,
    },
    Branch {
        settings: BranchSettings,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on_success_action: Option<Box<ActionNode>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on_failure_action: Option<Box<ActionNode>>,
    },
}

/// A node of the action graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionNode {
    /// Step name, unique across the flow version.
    pub name: String,
    /// Human-readable label.
    pub display_name: String,
    /// Whether the step is complete enough to run.
    #[serde(default)]
    pub valid: bool,
    /// Variant-specific settings and owned children.
    #[serde(flatten)]
    pub kind: ActionKind,
    /// The step executed after this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action: Option<Box<ActionNode>>,
}

impl ActionNode {
    /// Creates a node with no links.
    #[must_use]
    pub fn new(name: impl Into<String>, display_name: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            valid: false,
            kind,
            next_action: None,
        }
    }

    /// Creates a code step.
    #[must_use]
    pub fn code(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(
            name,
            display_name,
            ActionKind::Code {
                settings: CodeSettings::default(),
            },
        )
    }

    /// Creates a piece step.
    #[must_use]
    pub fn piece(
        name: impl Into<String>,
        display_name: impl Into<String>,
        settings: PieceSettings,
    ) -> Self {
        Self::new(name, display_name, ActionKind::Piece { settings })
    }

    /// Creates a loop step with an empty body.
    #[must_use]
    pub fn loop_on_items(
        name: impl Into<String>,
        display_name: impl Into<String>,
        items: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            display_name,
            ActionKind::LoopOnItems {
                settings: LoopSettings {
                    items: items.into(),
                },
                first_loop_action: None,
            },
        )
    }

    /// Creates a branch step without outcomes.
    #[must_use]
    pub fn branch(
        name: impl Into<String>,
        display_name: impl Into<String>,
        conditions: Vec<Vec<Condition>>,
    ) -> Self {
        Self::new(
            name,
            display_name,
            ActionKind::Branch {
                settings: BranchSettings { conditions },
                on_success_action: None,
                on_failure_action: None,
            },
        )
    }

    /// Sets the next step.
    #[must_use]
    pub fn then(mut self, next: ActionNode) -> Self {
        self.next_action = Some(Box::new(next));
        self
    }

    /// Sets the success outcome of a branch. No-op on other variants.
    #[must_use]
    pub fn on_success(mut self, child: ActionNode) -> Self {
        if let ActionKind::Branch {
            on_success_action, ..
        } = &mut self.kind
        {
            *on_success_action = Some(Box::new(child));
        }
        self
    }

    /// Sets the failure outcome of a branch. No-op on other variants.
    #[must_use]
    pub fn on_failure(mut self, child: ActionNode) -> Self {
        if let ActionKind::Branch {
            on_failure_action, ..
        } = &mut self.kind
        {
            *on_failure_action = Some(Box::new(child));
        }
        self
    }

    /// Sets the body of a loop. No-op on other variants.
    #[must_use]
    pub fn with_loop_body(mut self, child: ActionNode) -> Self {
        if let ActionKind::LoopOnItems {
            first_loop_action, ..
        } = &mut self.kind
        {
            *first_loop_action = Some(Box::new(child));
        }
        self
    }

    /// Returns the node's discriminant.
    #[must_use]
    pub fn action_type(&self) -> ActionType {
        match &self.kind {
            ActionKind::Code { .. } => ActionType::Code,
            ActionKind::Piece { .. } => ActionType::Piece,
            ActionKind::LoopOnItems { .. } => ActionType::LoopOnItems,
            ActionKind::Branch { .. } => ActionType::Branch,
        }
    }

    /// Returns the next step in the chain.
    #[must_use]
    pub fn next(&self) -> Option<&ActionNode> {
        self.next_action.as_deref()
    }

    /// Returns the loop body, if this is a loop with a body.
    #[must_use]
    pub fn first_loop_action(&self) -> Option<&ActionNode> {
        match &self.kind {
            ActionKind::LoopOnItems {
                first_loop_action, ..
            } => first_loop_action.as_deref(),
            _ => None,
        }
    }

    /// Returns the success outcome, if this is a branch with one.
    #[must_use]
    pub fn on_success_action(&self) -> Option<&ActionNode> {
        match &self.kind {
            ActionKind::Branch {
                on_success_action, ..
            } => on_success_action.as_deref(),
            _ => None,
        }
    }

    /// Returns the failure outcome, if this is a branch with one.
    #[must_use]
    pub fn on_failure_action(&self) -> Option<&ActionNode> {
        match &self.kind {
            ActionKind::Branch {
                on_failure_action, ..
            } => on_failure_action.as_deref(),
            _ => None,
        }
    }

    /// Returns the owned child subgraphs, excluding `next`.
    pub fn children(&self) -> impl Iterator<Item = &ActionNode> {
        self.first_loop_action()
            .into_iter()
            .chain(self.on_success_action())
            .chain(self.on_failure_action())
    }

    /// Returns children followed by `next`.
    pub fn successors(&self) -> impl Iterator<Item = &ActionNode> {
        self.children().chain(self.next())
    }

    /// Returns the step input, for variants that carry one.
    #[must_use]
    pub fn input(&self) -> Option<&InputMap> {
        match &self.kind {
            ActionKind::Code { settings } => Some(&settings.input),
            ActionKind::Piece { settings } => Some(&settings.input),
            ActionKind::LoopOnItems { .. } | ActionKind::Branch { .. } => None,
        }
    }

    /// Replaces the step input with an empty mapping.
    pub fn clear_input(&mut self) {
        match &mut self.kind {
            ActionKind::Code { settings } => settings.input.clear(),
            ActionKind::Piece { settings } => settings.input.clear(),
            ActionKind::LoopOnItems { .. } | ActionKind::Branch { .. } => {}
        }
    }

    /// Returns true if this node or any node below it has the given name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.name == name || self.successors().any(|node| node.contains(name))
    }

    /// Finds a node by name in this subtree.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ActionNode> {
        if self.name == name {
            return Some(self);
        }
        self.successors().find_map(|node| node.find(name))
    }

    /// Finds a node by name in this subtree, mutably.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut ActionNode> {
        if self.name == name {
            return Some(self);
        }
        let slot = self
            .slots_mut()
            .into_iter()
            .find(|slot| slot.as_deref().is_some_and(|node| node.contains(name)))?;
        slot.as_deref_mut()?.find_mut(name)
    }

    /// Returns the link slots owned by this node: `next` first, then children.
    pub(crate) fn slots_mut(&mut self) -> Vec<&mut Option<Box<ActionNode>>> {
        let ActionNode {
            kind, next_action, ..
        } = self;
        let mut slots = vec![next_action];
        match kind {
            ActionKind::LoopOnItems {
                first_loop_action, ..
            } => slots.push(first_loop_action),
            ActionKind::Branch {
                on_success_action,
                on_failure_action,
                ..
            } => {
                slots.push(on_success_action);
                slots.push(on_failure_action);
            }
            ActionKind::Code { .. } | ActionKind::Piece { .. } => {}
        }
        slots
    }

    /// Returns a copy of this node with every link removed.
    #[must_use]
    pub fn detached(&self) -> ActionNode {
        let kind = match &self.kind {
            ActionKind::Code { settings } => ActionKind::Code {
                settings: settings.clone(),
            },
            ActionKind::Piece { settings } => ActionKind::Piece {
                settings: settings.clone(),
            },
            ActionKind::LoopOnItems { settings, .. } => ActionKind::LoopOnItems {
                settings: settings.clone(),
                first_loop_action: None,
            },
            ActionKind::Branch { settings, .. } => ActionKind::Branch {
                settings: settings.clone(),
                on_success_action: None,
                on_failure_action: None,
            },
        };
        ActionNode {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            valid: self.valid,
            kind,
            next_action: None,
        }
    }

    /// Collects this node and everything below it in depth-first pre-order.
    ///
    /// Children are visited before `next`, so a branch's outcomes are listed
    /// before the step that follows the branch.
    #[must_use]
    pub fn descendants(&self) -> Vec<&ActionNode> {
        let mut visited = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            visited.push(node);
            let successors: Vec<&ActionNode> = node.successors().collect();
            stack.extend(successors.into_iter().rev());
        }
        visited
    }
}

/// Takes ownership of the first node in `slot` whose name matches, splicing
/// its `next` into the vacated position.
pub(crate) fn remove_from_slot(
    slot: &mut Option<Box<ActionNode>>,
    name: &str,
) -> Option<Box<ActionNode>> {
    let holds_target = slot.as_deref().is_some_and(|node| node.name == name);
    if holds_target {
        let mut removed = slot.take()?;
        *slot = removed.next_action.take();
        return Some(removed);
    }
    let node = slot.as_deref_mut()?;
    let child = node
        .slots_mut()
        .into_iter()
        .find(|child| child.as_deref().is_some_and(|n| n.contains(name)))?;
    remove_from_slot(child, name)
}
