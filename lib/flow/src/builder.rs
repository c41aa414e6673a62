//! Draft materialization.
//!
//! A draft is a trigger owning an action tree whose names and inputs are
//! not trusted (typically generated from a prompt). The builder renames
//! every step, clears action inputs, and replays the tree into a fresh flow
//! as a sequence of single-step [`FlowOperation`]s.
//!
//! Naming:
//! - Top-level actions are `step-1`, `step-2`, ... from one shared counter
//! - A branch `step-n` names its success chain `step-n-success`,
//!   `step-n-success-2`, ... and its failure chain `step-n-failure`, ...
//! - A loop `step-n` names its body `step-n-loop`, `step-n-loop-2`, ...
//! - Nested children use their parent's full name as prefix
//!
//! Only the top-level chain advances the counter.

use crate::action::ActionNode;
use crate::error::BuildError;
use crate::operation::{FlowOperation, StepLocation};
use crate::store::{CreateFlowRequest, FlowService};
use crate::trigger::{TRIGGER_NAME, Trigger};
use pieceflow_core::{FlowId, ProjectId, Result};
use rootcause::prelude::*;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Source of top-level step names.
///
/// Threaded by value through the planning walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepCounter(usize);

impl Default for StepCounter {
    fn default() -> Self {
        Self(1)
    }
}

impl StepCounter {
    /// Starts counting at `first`.
    #[must_use]
    pub fn starting_at(first: usize) -> Self {
        Self(first)
    }

    /// Returns the next name and the advanced counter.
    #[must_use]
    pub fn advance(self) -> (String, Self) {
        (format!("step-{}", self.0), Self(self.0 + 1))
    }
}

/// The operations that rebuild a draft, in application order.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftPlan {
    /// The trigger to install, without its chain.
    pub trigger: Trigger,
    /// One `AddAction` per draft action.
    pub operations: Vec<FlowOperation>,
}

/// Turns drafts into persisted flows.
#[derive(Clone)]
pub struct GraphBuilder {
    flows: Arc<dyn FlowService>,
}

impl GraphBuilder {
    /// Creates a builder writing through `flows`.
    #[must_use]
    pub fn new(flows: Arc<dyn FlowService>) -> Self {
        Self { flows }
    }

    /// Plans the operations for a draft without touching storage.
    #[must_use]
    pub fn plan(draft: &Trigger) -> DraftPlan {
        let mut trigger = draft.detached();
        trigger.name = TRIGGER_NAME.to_string();

        let mut operations = Vec::new();
        let mut counter = StepCounter::default();
        let mut parent = TRIGGER_NAME.to_string();
        let mut current = draft.next();
        while let Some(node) = current {
            let (name, advanced) = counter.advance();
            counter = advanced;
            operations.push(add_operation(&parent, StepLocation::After, node, &name));
            plan_children(node, &name, &mut operations);
            parent = name;
            current = node.next();
        }
        DraftPlan {
            trigger,
            operations,
        }
    }

    /// Creates a flow and replays the draft into it.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::FlowCreation`] if the flow cannot be created.
    /// Any later failure returns [`BuildError::PartialGraphMutation`]; the
    /// flow is kept with whatever was applied before the failure.
    #[instrument(skip(self, request, draft), fields(project_id = %project_id))]
    pub async fn materialize(
        &self,
        project_id: ProjectId,
        request: CreateFlowRequest,
        draft: &Trigger,
    ) -> Result<FlowId, BuildError> {
        let plan = Self::plan(draft);
        let total = plan.operations.len();

        let flow = self
            .flows
            .create(project_id, request)
            .await
            .context(BuildError::FlowCreation)?;
        let flow_id = flow.id;

        self.flows
            .update(project_id, flow_id, FlowOperation::UpdateTrigger(plan.trigger))
            .await
            .context_with(|| BuildError::PartialGraphMutation {
                flow_id,
                applied: 0,
                total,
            })?;

        for (applied, operation) in plan.operations.into_iter().enumerate() {
            let step = operation.step_name().to_string();
            if let Err(report) = self.flows.update(project_id, flow_id, operation).await {
                warn!(
                    flow_id = %flow_id,
                    step = %step,
                    applied,
                    total,
                    "draft materialization stopped, flow left partially built"
                );
                return Err(report.context(BuildError::PartialGraphMutation {
                    flow_id,
                    applied,
                    total,
                }));
            }
        }

        info!(flow_id = %flow_id, actions = total, "materialized draft");
        Ok(flow_id)
    }
}

fn add_operation(
    parent: &str,
    location: StepLocation,
    node: &ActionNode,
    name: &str,
) -> FlowOperation {
    let mut action = node.detached();
    action.name = name.to_string();
    action.clear_input();
    FlowOperation::AddAction {
        parent_step: parent.to_string(),
        location,
        action,
    }
}

fn plan_children(node: &ActionNode, name: &str, operations: &mut Vec<FlowOperation>) {
    let children = [
        (node.on_success_action(), StepLocation::InsideTrueBranch, "success"),
        (node.on_failure_action(), StepLocation::InsideFalseBranch, "failure"),
        (node.first_loop_action(), StepLocation::InsideLoop, "loop"),
    ];
    for (child, location, suffix) in children {
        if let Some(child) = child {
            plan_nested_chain(child, name, location, &format!("{name}-{suffix}"), operations);
        }
    }
}

fn plan_nested_chain(
    head: &ActionNode,
    owner: &str,
    location: StepLocation,
    prefix: &str,
    operations: &mut Vec<FlowOperation>,
) {
    let mut parent = owner.to_string();
    let mut location = location;
    let mut current = Some(head);
    let mut position = 1;
    while let Some(node) = current {
        let name = if position == 1 {
            prefix.to_string()
        } else {
            format!("{prefix}-{position}")
        };
        operations.push(add_operation(&parent, location, node, &name));
        plan_children(node, &name, operations);
        parent = name;
        location = StepLocation::After;
        current = node.next();
        position += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;
    use crate::condition::{BranchOperator, Condition};
    use crate::error::FlowError;
    use crate::store::InMemoryFlowService;
    use crate::version::{Flow, FlowVersion};
    use async_trait::async_trait;
    use pieceflow_core::CollectionId;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn code(label: &str) -> ActionNode {
        let mut node = ActionNode::code(format!("draft-{label}"), label);
        if let ActionKind::Code { settings } = &mut node.kind {
            settings.artifact = Some(format!("export const code = async () => '{label}';"));
            settings.input.insert("prompt".to_string(), json!("generated value"));
        }
        node
    }

    fn branch(label: &str) -> ActionNode {
        ActionNode::branch(
            format!("draft-{label}"),
            label,
            vec![vec![Condition::unary("{{trigger.ok}}", BranchOperator::BooleanIsTrue)]],
        )
    }

    fn request() -> CreateFlowRequest {
        CreateFlowRequest {
            display_name: "Generated".to_string(),
            collection_id: CollectionId::new(),
        }
    }

    fn chain(labels: &[&str]) -> Option<ActionNode> {
        labels
            .iter()
            .rev()
            .fold(None, |next, label| {
                let node = code(label);
                Some(match next {
                    Some(next) => node.then(next),
                    None => node,
                })
            })
    }

    async fn materialized(draft: &Trigger) -> FlowVersion {
        let service = Arc::new(InMemoryFlowService::default());
        let builder = GraphBuilder::new(service.clone());
        let project_id = pieceflow_core::ProjectId::new();
        let flow_id = builder
            .materialize(project_id, request(), draft)
            .await
            .expect("materialize");
        service
            .get_one(project_id, flow_id)
            .await
            .expect("stored")
            .version
    }

    fn step_names(version: &FlowVersion) -> Vec<String> {
        version.steps().map(|s| s.name().to_string()).collect()
    }

    #[test]
    fn counter_advances_by_value() {
        let counter = StepCounter::default();
        let (first, counter) = counter.advance();
        let (second, _) = counter.advance();
        assert_eq!(first, "step-1");
        assert_eq!(second, "step-2");
        assert_eq!(StepCounter::starting_at(7).advance().0, "step-7");
    }

    #[test]
    fn plan_clears_inputs_and_renames() {
        let draft = Trigger::webhook("Catch").then(code("A"));
        let plan = GraphBuilder::plan(&draft);
        assert!(plan.trigger.next().is_none());
        let [FlowOperation::AddAction { parent_step, location, action }] = plan.operations.as_slice()
        else {
            panic!("expected a single AddAction, got {:?}", plan.operations);
        };
        assert_eq!(parent_step, "trigger");
        assert_eq!(*location, StepLocation::After);
        assert_eq!(action.name, "step-1");
        assert_eq!(action.display_name, "A");
        assert_eq!(action.input().map(|input| input.len()), Some(0));
    }

    #[tokio::test]
    async fn linear_chain_is_named_in_order() {
        for length in 0..5 {
            let labels: Vec<String> = (0..length).map(|i| format!("A{i}")).collect();
            let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
            let mut draft = Trigger::webhook("Catch");
            if let Some(head) = chain(&refs) {
                draft = draft.then(head);
            }

            let version = materialized(&draft).await;
            let mut expected = vec!["trigger".to_string()];
            expected.extend((1..=length).map(|n| format!("step-{n}")));
            assert_eq!(step_names(&version), expected);

            let labels_in_order: Vec<&str> = version
                .all_actions()
                .iter()
                .map(|n| n.display_name.as_str())
                .collect();
            assert_eq!(labels_in_order, refs);
        }
    }

    #[tokio::test]
    async fn branch_children_reuse_parent_number() {
        let draft = Trigger::webhook("Catch").then(
            code("A").then(
                branch("Branch")
                    .on_success(code("B"))
                    .on_failure(code("C"))
                    .then(code("D")),
            ),
        );
        let version = materialized(&draft).await;

        assert_eq!(
            step_names(&version),
            vec!["trigger", "step-1", "step-2", "step-2-success", "step-2-failure", "step-3"]
        );
        let labels: Vec<(&str, &str)> = version
            .all_actions()
            .iter()
            .map(|n| (n.name.as_str(), n.display_name.as_str()))
            .collect();
        assert!(labels.contains(&("step-2-success", "B")));
        assert!(labels.contains(&("step-2-failure", "C")));
        assert!(labels.contains(&("step-3", "D")));

        let branch = version.get_action("step-2").expect("branch");
        assert_eq!(branch.next().map(|n| n.name.as_str()), Some("step-3"));
        assert!(branch.on_success_action().and_then(ActionNode::next).is_none());
        assert!(branch.on_failure_action().and_then(ActionNode::next).is_none());
        assert!(version.valid);
    }

    #[tokio::test]
    async fn branch_with_no_children_and_empty_loop_are_kept() {
        let draft = Trigger::webhook("Catch").then(
            branch("Branch").then(ActionNode::loop_on_items("draft-loop", "Each", "{{trigger.rows}}")),
        );
        let version = materialized(&draft).await;
        assert_eq!(step_names(&version), vec!["trigger", "step-1", "step-2"]);
        let looped = version.get_action("step-2").expect("loop");
        assert!(looped.first_loop_action().is_none());
    }

    #[tokio::test]
    async fn nested_chains_and_loop_bodies() {
        let draft = Trigger::webhook("Catch").then(
            branch("Outer")
                .on_success(
                    code("B1").then(
                        branch("Inner")
                            .on_failure(code("X"))
                            .then(code("B2")),
                    ),
                )
                .then(
                    ActionNode::loop_on_items("draft-loop", "Each", "{{trigger.rows}}")
                        .with_loop_body(chain(&["L1", "L2"]).expect("chain"))
                        .then(code("End")),
                ),
        );
        let version = materialized(&draft).await;

        assert_eq!(
            step_names(&version),
            vec![
                "trigger",
                "step-1",
                "step-1-success",
                "step-1-success-2",
                "step-1-success-2-failure",
                "step-1-success-3",
                "step-2",
                "step-2-loop",
                "step-2-loop-2",
                "step-3",
            ]
        );
        let names: Vec<String> = step_names(&version);
        let unique: HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[tokio::test]
    async fn piece_trigger_settings_survive() {
        let draft = Trigger::piece(
            "New row",
            crate::trigger::PieceTriggerSettings {
                piece_name: "google-sheets".to_string(),
                piece_version: "0.3.0".to_string(),
                trigger_name: "new_row".to_string(),
                ..Default::default()
            },
        );
        let version = materialized(&draft).await;
        assert_eq!(version.trigger.name, "trigger");
        assert_eq!(
            version.trigger.piece_settings().map(|s| s.trigger_name.as_str()),
            Some("new_row")
        );
        assert!(version.trigger.valid);
    }

    /// Accepts `budget` updates, then rejects every further one.
    struct FailingAfter {
        inner: InMemoryFlowService,
        budget: usize,
        updates: AtomicUsize,
    }

    #[async_trait]
    impl FlowService for FailingAfter {
        async fn create(
            &self,
            project_id: ProjectId,
            request: CreateFlowRequest,
        ) -> Result<Flow, FlowError> {
            self.inner.create(project_id, request).await
        }

        async fn update(
            &self,
            project_id: ProjectId,
            flow_id: FlowId,
            operation: FlowOperation,
        ) -> Result<Flow, FlowError> {
            if self.updates.fetch_add(1, Ordering::SeqCst) >= self.budget {
                return Err(FlowError::StorageFailed {
                    reason: "connection reset".to_string(),
                }
                .into());
            }
            self.inner.update(project_id, flow_id, operation).await
        }

        async fn get_one(
            &self,
            project_id: ProjectId,
            flow_id: FlowId,
        ) -> Result<Flow, FlowError> {
            self.inner.get_one(project_id, flow_id).await
        }
    }

    #[tokio::test]
    async fn failure_mid_walk_leaves_partial_flow() {
        let inner = InMemoryFlowService::default();
        // trigger + two actions
        let failing = Arc::new(FailingAfter {
            inner: inner.clone(),
            budget: 3,
            updates: AtomicUsize::new(0),
        });
        let builder = GraphBuilder::new(failing);
        let project_id = ProjectId::new();
        let draft = Trigger::webhook("Catch").then(chain(&["A", "B", "C", "D"]).expect("chain"));

        let report = builder
            .materialize(project_id, request(), &draft)
            .await
            .expect_err("fails on the third action");
        let BuildError::PartialGraphMutation {
            flow_id,
            applied,
            total,
        } = report.current_context().clone()
        else {
            panic!("unexpected error: {report}");
        };
        assert_eq!((applied, total), (2, 4));

        let partial = inner.get_one(project_id, flow_id).await.expect("kept");
        assert_eq!(step_names(&partial.version), vec!["trigger", "step-1", "step-2"]);
    }

    #[tokio::test]
    async fn creation_failure_is_reported() {
        struct Unavailable;

        #[async_trait]
        impl FlowService for Unavailable {
            async fn create(
                &self,
                _project_id: ProjectId,
                _request: CreateFlowRequest,
            ) -> Result<Flow, FlowError> {
                Err(FlowError::StorageFailed {
                    reason: "read only".to_string(),
                }
                .into())
            }

            async fn update(
                &self,
                _project_id: ProjectId,
                flow_id: FlowId,
                _operation: FlowOperation,
            ) -> Result<Flow, FlowError> {
                Err(FlowError::NotFound { flow_id }.into())
            }

            async fn get_one(
                &self,
                _project_id: ProjectId,
                flow_id: FlowId,
            ) -> Result<Flow, FlowError> {
                Err(FlowError::NotFound { flow_id }.into())
            }
        }

        let builder = GraphBuilder::new(Arc::new(Unavailable));
        let report = builder
            .materialize(ProjectId::new(), request(), &Trigger::webhook("Catch"))
            .await
            .expect_err("create fails");
        assert_eq!(report.current_context(), &BuildError::FlowCreation);
    }
}
