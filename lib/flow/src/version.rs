//! Flow and flow version types.
//!
//! A flow is the long-lived automation record; a flow version is a snapshot
//! of its trigger and the action tree the trigger owns. Every node of the
//! tree belongs to exactly one version.

use crate::action::ActionNode;
use crate::trigger::Trigger;
use chrono::{DateTime, Utc};
use pieceflow_core::{CollectionId, FlowId, FlowVersionId, ProjectId};
use serde::{Deserialize, Serialize};

/// A flow and its current version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    pub id: FlowId,
    pub project_id: ProjectId,
    pub collection_id: CollectionId,
    /// The version currently being authored.
    pub version: FlowVersion,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Flow {
    /// Creates a flow whose first version holds only an empty trigger.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        collection_id: CollectionId,
        display_name: impl Into<String>,
    ) -> Self {
        let id = FlowId::new();
        let now = Utc::now();
        Self {
            id,
            project_id,
            collection_id,
            version: FlowVersion::new(id, display_name),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A snapshot of a flow's trigger and action tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowVersion {
    pub id: FlowVersionId,
    pub flow_id: FlowId,
    pub display_name: String,
    /// Root of the graph; owns the action chain.
    pub trigger: Trigger,
    /// Whether the trigger and every reachable step are valid.
    #[serde(default)]
    pub valid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A step of a flow version: the trigger or one of its actions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step<'a> {
    Trigger(&'a Trigger),
    Action(&'a ActionNode),
}

impl Step<'_> {
    /// Returns the step name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Step::Trigger(trigger) => &trigger.name,
            Step::Action(action) => &action.name,
        }
    }

    /// Returns the human-readable label.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Step::Trigger(trigger) => &trigger.display_name,
            Step::Action(action) => &action.display_name,
        }
    }
}

impl FlowVersion {
    /// Creates a version with an empty trigger.
    #[must_use]
    pub fn new(flow_id: FlowId, display_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: FlowVersionId::new(),
            flow_id,
            display_name: display_name.into(),
            trigger: Trigger::empty(),
            valid: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns every reachable action in depth-first pre-order.
    #[must_use]
    pub fn all_actions(&self) -> Vec<&ActionNode> {
        self.trigger
            .next()
            .map(ActionNode::descendants)
            .unwrap_or_default()
    }

    /// Iterates over the trigger followed by every reachable action.
    pub fn steps(&self) -> impl Iterator<Item = Step<'_>> {
        std::iter::once(Step::Trigger(&self.trigger))
            .chain(self.all_actions().into_iter().map(Step::Action))
    }

    /// Finds a step by name.
    #[must_use]
    pub fn get_step(&self, name: &str) -> Option<Step<'_>> {
        if self.trigger.name == name {
            return Some(Step::Trigger(&self.trigger));
        }
        self.get_action(name).map(Step::Action)
    }

    /// Finds an action by name.
    #[must_use]
    pub fn get_action(&self, name: &str) -> Option<&ActionNode> {
        self.trigger.next()?.find(name)
    }

    /// Returns true if the trigger or any action uses the name.
    #[must_use]
    pub fn contains_step(&self, name: &str) -> bool {
        self.trigger.name == name || self.trigger.next().is_some_and(|n| n.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version_with_chain() -> FlowVersion {
        let mut version = FlowVersion::new(FlowId::new(), "Orders");
        version.trigger = Trigger::webhook("Catch").then(
            ActionNode::code("step-1", "A").then(
                ActionNode::loop_on_items("step-2", "Each", "{{trigger.items}}")
                    .with_loop_body(ActionNode::code("step-2-loop", "Body"))
                    .then(ActionNode::code("step-3", "D")),
            ),
        );
        version
    }

    #[test]
    fn new_flow_starts_with_empty_trigger() {
        let flow = Flow::new(ProjectId::new(), CollectionId::new(), "Untitled");
        assert_eq!(flow.version.flow_id, flow.id);
        assert_eq!(flow.version.trigger, Trigger::empty());
        assert!(!flow.version.valid);
        assert!(flow.version.all_actions().is_empty());
    }

    #[test]
    fn steps_start_with_trigger() {
        let version = version_with_chain();
        let names: Vec<String> = version.steps().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["trigger", "step-1", "step-2", "step-2-loop", "step-3"]);
    }

    #[test]
    fn get_step_finds_trigger_and_nested_actions() {
        let version = version_with_chain();
        assert!(matches!(version.get_step("trigger"), Some(Step::Trigger(_))));
        assert_eq!(
            version.get_step("step-2-loop").map(|s| s.display_name().to_string()),
            Some("Body".to_string())
        );
        assert!(version.get_step("step-9").is_none());
        assert!(version.contains_step("step-3"));
    }
}
