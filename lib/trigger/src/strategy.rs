//! Per-strategy enable and disable handling.
//!
//! After a trigger's `ON_ENABLE` or `ON_DISABLE` hook has run, what else
//! must happen depends on the trigger's strategy. Each strategy has one
//! [`StrategyHandler`].

use crate::error::TriggerError;
use crate::queue::{ExecutionQueue, JobData, PollingJob, RunEnvironment};
use crate::resolve::TriggerScope;
use crate::routing::{EventRoutingRegistrar, ListenerRequest};
use async_trait::async_trait;
use pieceflow_core::Result;
use pieceflow_flow::{FlowVersion, PieceTriggerSettings, TriggerType};
use pieceflow_piece::HookResponse;
use rootcause::prelude::*;
use std::sync::Arc;
use tracing::info;

/// The flow version whose piece trigger is being switched.
#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a> {
    pub scope: TriggerScope,
    pub flow_version: &'a FlowVersion,
    pub settings: &'a PieceTriggerSettings,
}

/// Follow-up work for one trigger strategy.
#[async_trait]
pub trait StrategyHandler: Send + Sync {
    /// Runs after a successful `ON_ENABLE` hook.
    async fn enable(
        &self,
        context: StrategyContext<'_>,
        response: HookResponse,
    ) -> Result<(), TriggerError>;

    /// Runs after a successful `ON_DISABLE` hook. Must succeed when there is
    /// nothing to tear down.
    async fn disable(&self, context: StrategyContext<'_>) -> Result<(), TriggerError>;
}

/// Generic webhooks need nothing beyond the hook itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookStrategy;

#[async_trait]
impl StrategyHandler for WebhookStrategy {
    async fn enable(
        &self,
        _context: StrategyContext<'_>,
        _response: HookResponse,
    ) -> Result<(), TriggerError> {
        Ok(())
    }

    async fn disable(&self, _context: StrategyContext<'_>) -> Result<(), TriggerError> {
        Ok(())
    }
}

/// Registers the listeners an app-webhook trigger asks for.
#[derive(Clone)]
pub struct AppWebhookStrategy {
    routing: Arc<dyn EventRoutingRegistrar>,
}

impl AppWebhookStrategy {
    #[must_use]
    pub fn new(routing: Arc<dyn EventRoutingRegistrar>) -> Self {
        Self { routing }
    }
}

#[async_trait]
impl StrategyHandler for AppWebhookStrategy {
    /// Listeners are registered one by one; a failure leaves the earlier
    /// ones registered.
    async fn enable(
        &self,
        context: StrategyContext<'_>,
        response: HookResponse,
    ) -> Result<(), TriggerError> {
        let flow_id = context.flow_version.flow_id;
        let app_name = &context.settings.piece_name;
        let count = response.listeners.len();
        for listener in response.listeners {
            self.routing
                .create_listeners(ListenerRequest {
                    project_id: context.scope.project_id,
                    flow_id,
                    app_name: app_name.clone(),
                    events: listener.events,
                    identifier_value: listener.identifier_value,
                })
                .await
                .context_with(|| TriggerError::ListenerRegistrationFailed {
                    flow_id,
                    app_name: app_name.clone(),
                })?;
        }
        info!(flow_id = %flow_id, app = %app_name, listeners = count, "app webhook enabled");
        Ok(())
    }

    async fn disable(&self, context: StrategyContext<'_>) -> Result<(), TriggerError> {
        let flow_id = context.flow_version.flow_id;
        self.routing
            .delete_listeners(context.scope.project_id, flow_id)
            .await
            .context(TriggerError::ListenerRemovalFailed { flow_id })?;
        Ok(())
    }
}

/// Schedules the recurring job of a polling trigger.
#[derive(Clone)]
pub struct PollingStrategy {
    queue: Arc<dyn ExecutionQueue>,
}

impl PollingStrategy {
    #[must_use]
    pub fn new(queue: Arc<dyn ExecutionQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl StrategyHandler for PollingStrategy {
    async fn enable(
        &self,
        context: StrategyContext<'_>,
        response: HookResponse,
    ) -> Result<(), TriggerError> {
        let flow_version_id = context.flow_version.id;
        let schedule_options = response
            .schedule_options
            .ok_or(TriggerError::MissingScheduleOptions { flow_version_id })?;
        let cron = schedule_options.cron_expression.clone();

        self.queue
            .add(PollingJob {
                id: flow_version_id,
                data: JobData {
                    project_id: context.scope.project_id,
                    environment: RunEnvironment::Production,
                    collection_id: context.scope.collection_id,
                    flow_version: context.flow_version.clone(),
                    trigger_type: TriggerType::Piece,
                },
                schedule_options,
            })
            .await
            .context(TriggerError::JobSchedulingFailed { flow_version_id })?;
        info!(flow_version_id = %flow_version_id, cron = %cron, "polling trigger enabled");
        Ok(())
    }

    async fn disable(&self, context: StrategyContext<'_>) -> Result<(), TriggerError> {
        let flow_version_id = context.flow_version.id;
        self.queue
            .remove_repeatable_job(flow_version_id)
            .await
            .context(TriggerError::JobRemovalFailed { flow_version_id })?;
        Ok(())
    }
}
