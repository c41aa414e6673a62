//! Trigger enable/disable orchestration.
//!
//! Only piece triggers have anything to switch; for every other trigger
//! type both operations succeed without side effects. Hook failures are
//! returned to the caller: enabling a flow is an explicit authoring action
//! and a misconfigured trigger should fail loudly.
//!
//! The orchestrator holds no lock. Callers serialize enable and disable for
//! the same flow version.

use crate::error::TriggerError;
use crate::queue::ExecutionQueue;
use crate::resolve::{PieceTriggers, TriggerScope};
use crate::routing::EventRoutingRegistrar;
use crate::strategy::{
    AppWebhookStrategy, PollingStrategy, StrategyContext, StrategyHandler, WebhookStrategy,
};
use pieceflow_core::Result;
use pieceflow_flow::FlowVersion;
use pieceflow_piece::{HookType, TriggerStrategy};
use rootcause::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Switches flow version triggers on and off.
#[derive(Clone)]
pub struct TriggerLifecycle {
    triggers: PieceTriggers,
    webhook: Arc<dyn StrategyHandler>,
    app_webhook: Arc<dyn StrategyHandler>,
    polling: Arc<dyn StrategyHandler>,
}

impl TriggerLifecycle {
    /// Creates an orchestrator with the standard strategy handlers.
    #[must_use]
    pub fn new(
        triggers: PieceTriggers,
        routing: Arc<dyn EventRoutingRegistrar>,
        queue: Arc<dyn ExecutionQueue>,
    ) -> Self {
        Self {
            triggers,
            webhook: Arc::new(WebhookStrategy),
            app_webhook: Arc::new(AppWebhookStrategy::new(routing)),
            polling: Arc::new(PollingStrategy::new(queue)),
        }
    }

    /// Replaces the handler used for one strategy.
    #[must_use]
    pub fn with_handler(
        mut self,
        strategy: TriggerStrategy,
        handler: Arc<dyn StrategyHandler>,
    ) -> Self {
        match strategy {
            TriggerStrategy::Webhook => self.webhook = handler,
            TriggerStrategy::AppWebhook => self.app_webhook = handler,
            TriggerStrategy::Polling => self.polling = handler,
        }
        self
    }

    fn handler(&self, strategy: TriggerStrategy) -> &dyn StrategyHandler {
        match strategy {
            TriggerStrategy::Webhook => self.webhook.as_ref(),
            TriggerStrategy::AppWebhook => self.app_webhook.as_ref(),
            TriggerStrategy::Polling => self.polling.as_ref(),
        }
    }

    /// Enables the flow version's trigger.
    ///
    /// Runs the `ON_ENABLE` hook, then the strategy's registration. Enabling
    /// an already enabled trigger replaces its job and re-registers the same
    /// listeners.
    ///
    /// # Errors
    ///
    /// Returns an error if the trigger cannot be resolved, the hook fails, or
    /// the strategy's registration fails.
    #[instrument(skip(self, flow_version), fields(flow_version_id = %flow_version.id))]
    pub async fn enable(
        &self,
        scope: TriggerScope,
        flow_version: &FlowVersion,
    ) -> Result<(), TriggerError> {
        let Some(settings) = flow_version.trigger.piece_settings() else {
            debug!(trigger_type = ?flow_version.trigger.trigger_type(), "nothing to enable");
            return Ok(());
        };
        let definition = self.triggers.resolve(settings).await?;

        let response = self
            .triggers
            .invoke(HookType::OnEnable, scope, flow_version, None)
            .await
            .context(TriggerError::HookFailed {
                hook: HookType::OnEnable,
            })?;

        let context = StrategyContext {
            scope,
            flow_version,
            settings,
        };
        self.handler(definition.strategy)
            .enable(context, response)
            .await?;
        info!(
            flow_id = %flow_version.flow_id,
            piece = %settings.piece_name,
            trigger = %settings.trigger_name,
            strategy = %definition.strategy,
            "trigger enabled"
        );
        Ok(())
    }

    /// Disables the flow version's trigger.
    ///
    /// Always runs the `ON_DISABLE` hook first, then the strategy's teardown.
    /// Disabling a trigger that was never enabled succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the trigger cannot be resolved, the hook fails, or
    /// the teardown fails.
    #[instrument(skip(self, flow_version), fields(flow_version_id = %flow_version.id))]
    pub async fn disable(
        &self,
        scope: TriggerScope,
        flow_version: &FlowVersion,
    ) -> Result<(), TriggerError> {
        let Some(settings) = flow_version.trigger.piece_settings() else {
            debug!(trigger_type = ?flow_version.trigger.trigger_type(), "nothing to disable");
            return Ok(());
        };
        let definition = self.triggers.resolve(settings).await?;

        self.triggers
            .invoke(HookType::OnDisable, scope, flow_version, None)
            .await
            .context(TriggerError::HookFailed {
                hook: HookType::OnDisable,
            })?;

        let context = StrategyContext {
            scope,
            flow_version,
            settings,
        };
        self.handler(definition.strategy).disable(context).await?;
        info!(
            flow_id = %flow_version.flow_id,
            piece = %settings.piece_name,
            trigger = %settings.trigger_name,
            strategy = %definition.strategy,
            "trigger disabled"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::InMemoryExecutionQueue;
    use crate::resolve::test_support::*;
    use crate::routing::InMemoryEventRouting;
    use pieceflow_core::FlowId;
    use pieceflow_flow::Trigger;
    use pieceflow_piece::{HookError, HookResponse, ScheduleOptions, WebhookListener};

    struct Fixture {
        hooks: Arc<ScriptedHooks>,
        routing: Arc<InMemoryEventRouting>,
        queue: Arc<InMemoryExecutionQueue>,
        lifecycle: TriggerLifecycle,
    }

    fn fixture(hooks: Arc<ScriptedHooks>) -> Fixture {
        let routing = Arc::new(InMemoryEventRouting::new());
        let queue = Arc::new(InMemoryExecutionQueue::new());
        let lifecycle = TriggerLifecycle::new(triggers(hooks.clone()), routing.clone(), queue.clone());
        Fixture {
            hooks,
            routing,
            queue,
            lifecycle,
        }
    }

    fn polling_response() -> HookResponse {
        HookResponse::with_schedule(ScheduleOptions::cron("*/5 * * * *"))
    }

    #[tokio::test]
    async fn polling_enable_then_disable_leaves_no_job() {
        let f = fixture(ScriptedHooks::answering(polling_response()));
        let version = piece_version(PIECE, POLLING_TRIGGER);
        let scope = scope();

        f.lifecycle.enable(scope, &version).await.expect("enable");
        assert!(f.queue.get(version.id).await.is_some());

        f.lifecycle.disable(scope, &version).await.expect("disable");
        assert!(f.queue.get(version.id).await.is_none());
        assert_eq!(f.hooks.hook_types(), vec![HookType::OnEnable, HookType::OnDisable]);
    }

    #[tokio::test]
    async fn disable_without_enable_succeeds() {
        for trigger in [POLLING_TRIGGER, APP_TRIGGER, WEBHOOK_TRIGGER] {
            let f = fixture(ScriptedHooks::answering(HookResponse::empty()));
            let version = piece_version(PIECE, trigger);
            f.lifecycle
                .disable(scope(), &version)
                .await
                .expect("disable is safe");
            assert_eq!(f.hooks.hook_types(), vec![HookType::OnDisable]);
        }
    }

    #[tokio::test]
    async fn enabling_twice_does_not_double_register() {
        let response = HookResponse {
            listeners: vec![WebhookListener {
                events: vec!["message".to_string()],
                identifier_value: "T1".to_string(),
            }],
            ..polling_response()
        };
        let f = fixture(ScriptedHooks::answering(response));
        let scope = scope();

        let polling = piece_version(PIECE, POLLING_TRIGGER);
        f.lifecycle.enable(scope, &polling).await.expect("first");
        f.lifecycle.enable(scope, &polling).await.expect("second");
        assert_eq!(f.queue.len().await, 1);

        let app = piece_version(PIECE, APP_TRIGGER);
        f.lifecycle.enable(scope, &app).await.expect("first");
        f.lifecycle.enable(scope, &app).await.expect("second");
        assert_eq!(f.routing.len().await, 1);
        assert_eq!(f.routing.find_flows(PIECE, "message", "T1").await, vec![app.flow_id]);
    }

    #[tokio::test]
    async fn app_webhook_disable_removes_listeners() {
        let response = HookResponse::with_listeners(vec![WebhookListener {
            events: vec!["message".to_string(), "mention".to_string()],
            identifier_value: "T1".to_string(),
        }]);
        let f = fixture(ScriptedHooks::answering(response));
        let version = piece_version(PIECE, APP_TRIGGER);
        let scope = scope();

        f.lifecycle.enable(scope, &version).await.expect("enable");
        assert_eq!(f.routing.len().await, 2);
        f.lifecycle.disable(scope, &version).await.expect("disable");
        assert!(f.routing.is_empty().await);
    }

    #[tokio::test]
    async fn app_webhook_listener_without_events_enables() {
        let response = HookResponse::with_listeners(vec![
            WebhookListener {
                events: Vec::new(),
                identifier_value: "T1".to_string(),
            },
            WebhookListener {
                events: vec!["message".to_string()],
                identifier_value: "T2".to_string(),
            },
        ]);
        let f = fixture(ScriptedHooks::answering(response));
        let version = piece_version(PIECE, APP_TRIGGER);

        f.lifecycle.enable(scope(), &version).await.expect("enable");
        assert_eq!(f.routing.len().await, 1);
        assert_eq!(f.routing.find_flows(PIECE, "message", "T2").await, vec![version.flow_id]);
    }

    #[tokio::test]
    async fn webhook_strategy_only_runs_hooks() {
        let f = fixture(ScriptedHooks::answering(polling_response()));
        let version = piece_version(PIECE, WEBHOOK_TRIGGER);

        f.lifecycle.enable(scope(), &version).await.expect("enable");
        assert!(f.queue.is_empty().await);
        assert!(f.routing.is_empty().await);
        assert_eq!(f.hooks.hook_types(), vec![HookType::OnEnable]);
    }

    #[tokio::test]
    async fn non_piece_triggers_are_no_ops() {
        let f = fixture(ScriptedHooks::failing());
        for trigger in [Trigger::empty(), Trigger::webhook("Catch")] {
            let mut version = FlowVersion::new(FlowId::new(), "Plain");
            version.trigger = trigger;
            f.lifecycle.enable(scope(), &version).await.expect("enable");
            f.lifecycle.disable(scope(), &version).await.expect("disable");
        }
        assert!(f.hooks.hook_types().is_empty());
    }

    #[tokio::test]
    async fn hook_failure_propagates() {
        let f = fixture(ScriptedHooks::failing());
        let version = piece_version(PIECE, POLLING_TRIGGER);

        let report = f.lifecycle.enable(scope(), &version).await.expect_err("enable");
        assert_eq!(
            report.current_context(),
            &TriggerError::HookFailed {
                hook: HookType::OnEnable
            }
        );
        assert!(
            report
                .iter_reports()
                .any(|r| r.downcast_current_context::<HookError>().is_some())
        );
        assert!(f.queue.is_empty().await);

        let report = f.lifecycle.disable(scope(), &version).await.expect_err("disable");
        assert_eq!(
            report.current_context(),
            &TriggerError::HookFailed {
                hook: HookType::OnDisable
            }
        );
    }

    #[tokio::test]
    async fn unresolvable_trigger_is_fatal_and_skips_hooks() {
        let f = fixture(ScriptedHooks::answering(polling_response()));
        let version = piece_version("unknown-piece", POLLING_TRIGGER);

        let report = f.lifecycle.enable(scope(), &version).await.expect_err("enable");
        assert!(matches!(
            report.current_context(),
            TriggerError::PieceNotFound { .. }
        ));
        let report = f
            .lifecycle
            .disable(scope(), &piece_version(PIECE, "unknown"))
            .await
            .expect_err("disable");
        assert!(matches!(
            report.current_context(),
            TriggerError::TriggerNotFound { .. }
        ));
        assert!(f.hooks.hook_types().is_empty());
    }
}
