//! Trigger types for flow initiation.
//!
//! The trigger is the root of a flow version's graph: it owns the first
//! action of the execution chain. Only piece triggers delegate to an
//! integration; how a piece trigger listens for events (its strategy) is a
//! property of the piece's trigger definition, not of the flow.

use crate::action::{ActionNode, InputMap};
use serde::{Deserialize, Serialize};

/// The fixed step name of every flow trigger.
pub const TRIGGER_NAME: &str = "trigger";

/// The discriminant of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    /// Placeholder trigger of a flow that has not been configured yet.
    Empty,
    /// Generic webhook owned by the platform.
    Webhook,
    /// Trigger implemented by a piece.
    Piece,
}

/// Settings of a piece trigger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceTriggerSettings {
    pub piece_name: String,
    pub piece_version: String,
    pub trigger_name: String,
    #[serde(default)]
    pub input: InputMap,
    #[serde(default)]
    pub input_ui_info: InputMap,
}

/// Variant-specific part of a trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerKind {
    Empty,
    Webhook,
    Piece { settings: PieceTriggerSettings },
}

/// The trigger of a flow version together with the action chain it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    /// Step name, always [`TRIGGER_NAME`] once persisted.
    pub name: String,
    /// Human-readable label.
    pub display_name: String,
    /// Whether the trigger is fully configured.
    #[serde(default)]
    pub valid: bool,
    /// Variant-specific settings.
    #[serde(flatten)]
    pub kind: TriggerKind,
    /// First action of the flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_action: Option<Box<ActionNode>>,
}

impl Trigger {
    /// Creates the placeholder trigger of a new flow.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            name: TRIGGER_NAME.to_string(),
            display_name: "Select Trigger".to_string(),
            valid: false,
            kind: TriggerKind::Empty,
            next_action: None,
        }
    }

    /// Creates a generic webhook trigger.
    #[must_use]
    pub fn webhook(display_name: impl Into<String>) -> Self {
        Self {
            name: TRIGGER_NAME.to_string(),
            display_name: display_name.into(),
            valid: true,
            kind: TriggerKind::Webhook,
            next_action: None,
        }
    }

    /// Creates a piece trigger.
    #[must_use]
    pub fn piece(display_name: impl Into<String>, settings: PieceTriggerSettings) -> Self {
        Self {
            name: TRIGGER_NAME.to_string(),
            display_name: display_name.into(),
            valid: false,
            kind: TriggerKind::Piece { settings },
            next_action: None,
        }
    }

    /// Sets the first action.
    #[must_use]
    pub fn then(mut self, next: ActionNode) -> Self {
        self.next_action = Some(Box::new(next));
        self
    }

    /// Returns the trigger type.
    #[must_use]
    pub fn trigger_type(&self) -> TriggerType {
        match &self.kind {
            TriggerKind::Empty => TriggerType::Empty,
            TriggerKind::Webhook => TriggerType::Webhook,
            TriggerKind::Piece { .. } => TriggerType::Piece,
        }
    }

    /// Returns the piece settings, if this is a piece trigger.
    #[must_use]
    pub fn piece_settings(&self) -> Option<&PieceTriggerSettings> {
        match &self.kind {
            TriggerKind::Piece { settings } => Some(settings),
            TriggerKind::Empty | TriggerKind::Webhook => None,
        }
    }

    /// Returns the first action of the chain.
    #[must_use]
    pub fn next(&self) -> Option<&ActionNode> {
        self.next_action.as_deref()
    }

    /// Returns a copy of this trigger without its action chain.
    #[must_use]
    pub fn detached(&self) -> Trigger {
        Trigger {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            valid: self.valid,
            kind: self.kind.clone(),
            next_action: None,
        }
    }
}
