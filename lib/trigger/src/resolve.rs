//! Piece trigger resolution and hook calls.

use crate::error::TriggerError;
use crate::webhook::WebhookUrlResolver;
use pieceflow_core::{CollectionId, ProjectId, Result};
use pieceflow_flow::{FlowVersion, PieceTriggerSettings};
use pieceflow_piece::{
    HookError, HookInvoker, HookRequest, HookResponse, HookType, PieceRegistry, TriggerDefinition,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// The project and collection a flow belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerScope {
    pub project_id: ProjectId,
    pub collection_id: CollectionId,
}

impl TriggerScope {
    #[must_use]
    pub fn new(project_id: ProjectId, collection_id: CollectionId) -> Self {
        Self {
            project_id,
            collection_id,
        }
    }
}

/// Collaborators shared by dispatch and the lifecycle orchestrator.
#[derive(Clone)]
pub struct PieceTriggers {
    registry: Arc<dyn PieceRegistry>,
    hooks: Arc<dyn HookInvoker>,
    webhooks: Arc<dyn WebhookUrlResolver>,
}

impl PieceTriggers {
    #[must_use]
    pub fn new(
        registry: Arc<dyn PieceRegistry>,
        hooks: Arc<dyn HookInvoker>,
        webhooks: Arc<dyn WebhookUrlResolver>,
    ) -> Self {
        Self {
            registry,
            hooks,
            webhooks,
        }
    }

    /// Finds the trigger definition a flow's piece trigger refers to.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::PieceNotFound`] or
    /// [`TriggerError::TriggerNotFound`] for dangling references.
    pub async fn resolve(
        &self,
        settings: &PieceTriggerSettings,
    ) -> Result<TriggerDefinition, TriggerError> {
        let piece = self
            .registry
            .get_piece(&settings.piece_name)
            .await
            .ok_or_else(|| TriggerError::PieceNotFound {
                piece_name: settings.piece_name.clone(),
                piece_version: settings.piece_version.clone(),
            })?;
        let trigger = piece
            .get_trigger(&settings.trigger_name)
            .ok_or_else(|| TriggerError::TriggerNotFound {
                piece_name: settings.piece_name.clone(),
                piece_version: settings.piece_version.clone(),
                trigger_name: settings.trigger_name.clone(),
            })?;
        Ok(trigger.clone())
    }

    /// Runs one hook of the flow version's trigger.
    ///
    /// # Errors
    ///
    /// Returns whatever the hook invoker reports.
    pub async fn invoke(
        &self,
        hook_type: HookType,
        scope: TriggerScope,
        flow_version: &FlowVersion,
        trigger_payload: Option<JsonValue>,
    ) -> Result<HookResponse, HookError> {
        let request = HookRequest {
            hook_type,
            flow_version: flow_version.clone(),
            trigger_payload,
            webhook_url: self.webhooks.webhook_url(flow_version.flow_id),
            project_id: scope.project_id,
            collection_id: scope.collection_id,
        };
        self.hooks.invoke(request).await
    }
}
