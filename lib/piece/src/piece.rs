//! Piece metadata.
//!
//! A piece is a third-party integration exposing actions and triggers. Each
//! trigger definition carries the [`TriggerStrategy`] that decides how the
//! platform listens for its events.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// How a piece trigger receives events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerStrategy {
    /// The platform's generic per-flow webhook URL receives events.
    Webhook,
    /// Events arrive on an app-wide endpoint and are routed by listener.
    AppWebhook,
    /// A recurring job asks the piece for new items.
    Polling,
}

impl TriggerStrategy {
    /// Returns the wire name of the strategy.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Webhook => "WEBHOOK",
            Self::AppWebhook => "APP_WEBHOOK",
            Self::Polling => "POLLING",
        }
    }
}

impl fmt::Display for TriggerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trigger exposed by a piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerDefinition {
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// Activation mechanism.
    #[serde(rename = "type")]
    pub strategy: TriggerStrategy,
    /// Example of one emitted payload, shown while authoring.
    #[serde(default)]
    pub sample_data: JsonValue,
}

impl TriggerDefinition {
    /// Creates a trigger definition.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        strategy: TriggerStrategy,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: String::new(),
            strategy,
            sample_data: JsonValue::Null,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the sample payload.
    #[must_use]
    pub fn with_sample_data(mut self, sample_data: JsonValue) -> Self {
        self.sample_data = sample_data;
        self
    }
}

/// An action exposed by a piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition {
    pub name: String,
    pub display_name: String,
    pub description: String,
}

impl ActionDefinition {
    /// Creates an action definition.
    #[must_use]
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            description: String::new(),
        }
    }
}

/// An integration plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Piece {
    /// Registry name, e.g. `google-business`.
    pub name: String,
    pub display_name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
    #[serde(default)]
    pub triggers: Vec<TriggerDefinition>,
}

impl Piece {
    /// Creates a piece with no actions or triggers.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            version: version.into(),
            logo_url: None,
            actions: Vec::new(),
            triggers: Vec::new(),
        }
    }

    /// Adds a trigger.
    #[must_use]
    pub fn with_trigger(mut self, trigger: TriggerDefinition) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Adds an action.
    #[must_use]
    pub fn with_action(mut self, action: ActionDefinition) -> Self {
        self.actions.push(action);
        self
    }

    /// Looks up a trigger by name.
    #[must_use]
    pub fn get_trigger(&self, name: &str) -> Option<&TriggerDefinition> {
        self.triggers.iter().find(|trigger| trigger.name == name)
    }

    /// Looks up an action by name.
    #[must_use]
    pub fn get_action(&self, name: &str) -> Option<&ActionDefinition> {
        self.actions.iter().find(|action| action.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookups_by_name() {
        let piece = Piece::new("google-business", "Google Business", "0.0.1")
            .with_trigger(TriggerDefinition::new(
                "new_review_trigger",
                "New Review",
                TriggerStrategy::Webhook,
            ))
            .with_action(ActionDefinition::new("reply_review", "Reply to Review"));

        assert_eq!(
            piece.get_trigger("new_review_trigger").map(|t| t.strategy),
            Some(TriggerStrategy::Webhook)
        );
        assert!(piece.get_trigger("reply_review").is_none());
        assert!(piece.get_action("reply_review").is_some());
    }

    #[test]
    fn trigger_strategy_is_serialized_as_type() {
        let trigger = TriggerDefinition::new("new_row", "New Row", TriggerStrategy::Polling)
            .with_sample_data(json!({"row": 1}));
        let value = serde_json::to_value(&trigger).expect("serialize");
        assert_eq!(value["type"], "POLLING");
        assert_eq!(value["sampleData"]["row"], 1);
        assert_eq!(TriggerStrategy::AppWebhook.to_string(), "APP_WEBHOOK");
    }
}
