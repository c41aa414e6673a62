//! Flow persistence.
//!
//! The [`FlowService`] trait is the seam to whatever stores flows. Graph
//! mutations go through [`FlowService::update`] one operation at a time,
//! each one an independent read-modify-write of the stored version.

use crate::error::FlowError;
use crate::operation::FlowOperation;
use crate::validate::{BraceExpressionResolver, ExpressionResolver};
use crate::version::Flow;
use async_trait::async_trait;
use chrono::Utc;
use pieceflow_core::{CollectionId, FlowId, ProjectId, Result};
use rootcause::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Request to create an empty flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlowRequest {
    pub display_name: String,
    pub collection_id: CollectionId,
}

/// Storage of flows and their versions.
#[async_trait]
pub trait FlowService: Send + Sync {
    /// Creates a flow with an empty trigger and no actions.
    async fn create(
        &self,
        project_id: ProjectId,
        request: CreateFlowRequest,
    ) -> Result<Flow, FlowError>;

    /// Applies one graph mutation to the flow's current version.
    async fn update(
        &self,
        project_id: ProjectId,
        flow_id: FlowId,
        operation: FlowOperation,
    ) -> Result<Flow, FlowError>;

    /// Loads a flow.
    async fn get_one(&self, project_id: ProjectId, flow_id: FlowId)
    -> Result<Flow, FlowError>;
}

/// Flow storage held in process memory.
#[derive(Clone)]
pub struct InMemoryFlowService {
    flows: Arc<RwLock<HashMap<FlowId, Flow>>>,
    resolver: Arc<dyn ExpressionResolver>,
}

impl Default for InMemoryFlowService {
    fn default() -> Self {
        Self::new(Arc::new(BraceExpressionResolver))
    }
}

impl InMemoryFlowService {
    /// Creates an empty store validating expressions with `resolver`.
    #[must_use]
    pub fn new(resolver: Arc<dyn ExpressionResolver>) -> Self {
        Self {
            flows: Arc::new(RwLock::new(HashMap::new())),
            resolver,
        }
    }

    /// Returns the number of stored flows.
    pub async fn len(&self) -> usize {
        self.flows.read().await.len()
    }

    /// Returns whether no flows are stored.
    pub async fn is_empty(&self) -> bool {
        self.flows.read().await.is_empty()
    }
}

#[async_trait]
impl FlowService for InMemoryFlowService {
    async fn create(
        &self,
        project_id: ProjectId,
        request: CreateFlowRequest,
    ) -> Result<Flow, FlowError> {
        let flow = Flow::new(project_id, request.collection_id, request.display_name);
        debug!(flow_id = %flow.id, "created flow");
        self.flows.write().await.insert(flow.id, flow.clone());
        Ok(flow)
    }

    async fn update(
        &self,
        project_id: ProjectId,
        flow_id: FlowId,
        operation: FlowOperation,
    ) -> Result<Flow, FlowError> {
        let mut flows = self.flows.write().await;
        let flow = flows
            .get_mut(&flow_id)
            .filter(|flow| flow.project_id == project_id)
            .ok_or(FlowError::NotFound { flow_id })?;

        let step = operation.step_name().to_string();
        let mut version = flow.version.clone();
        version
            .apply(operation, self.resolver.as_ref())
            .context(FlowError::MutationRejected { flow_id })?;

        debug!(flow_id = %flow_id, step = %step, "applied flow operation");
        flow.version = version;
        flow.updated_at = Utc::now();
        Ok(flow.clone())
    }

    async fn get_one(
        &self,
        project_id: ProjectId,
        flow_id: FlowId,
    ) -> Result<Flow, FlowError> {
        self.flows
            .read()
            .await
            .get(&flow_id)
            .filter(|flow| flow.project_id == project_id)
            .cloned()
            .ok_or_else(|| FlowError::NotFound { flow_id }.into())
    }
}
