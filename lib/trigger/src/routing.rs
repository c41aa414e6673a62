//! App-event routing.
//!
//! App-webhook pieces receive events on one endpoint per app. The registrar
//! remembers which flows listen for which `(app, event, identifier)` so
//! incoming app events can be routed to flows.

use crate::error::RoutingError;
use async_trait::async_trait;
use pieceflow_core::{FlowId, ProjectId, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Listener registration for one flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerRequest {
    pub project_id: ProjectId,
    pub flow_id: FlowId,
    /// The piece name of the app.
    pub app_name: String,
    pub events: Vec<String>,
    pub identifier_value: String,
}

/// Registers and removes app-event listeners.
#[async_trait]
pub trait EventRoutingRegistrar: Send + Sync {
    /// Registers a flow for every event in the request. A request with no
    /// events registers nothing and succeeds.
    async fn create_listeners(&self, request: ListenerRequest) -> Result<(), RoutingError>;

    /// Removes every listener of a flow. Succeeds when there are none.
    async fn delete_listeners(
        &self,
        project_id: ProjectId,
        flow_id: FlowId,
    ) -> Result<(), RoutingError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ListenerKey {
    project_id: ProjectId,
    flow_id: FlowId,
    app_name: String,
    event: String,
    identifier_value: String,
}

/// Event routing held in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventRouting {
    listeners: Arc<RwLock<HashSet<ListenerKey>>>,
}

impl InMemoryEventRouting {
    /// Creates an empty registrar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the flows listening for an app event.
    pub async fn find_flows(
        &self,
        app_name: &str,
        event: &str,
        identifier_value: &str,
    ) -> Vec<FlowId> {
        let mut flows: Vec<FlowId> = self
            .listeners
            .read()
            .await
            .iter()
            .filter(|key| {
                key.app_name == app_name
                    && key.event == event
                    && key.identifier_value == identifier_value
            })
            .map(|key| key.flow_id)
            .collect();
        flows.sort();
        flows.dedup();
        flows
    }

    /// Returns the number of registered listeners.
    pub async fn len(&self) -> usize {
        self.listeners.read().await.len()
    }

    /// Returns whether no listeners are registered.
    pub async fn is_empty(&self) -> bool {
        self.listeners.read().await.is_empty()
    }
}

#[async_trait]
impl EventRoutingRegistrar for InMemoryEventRouting {
    async fn create_listeners(&self, request: ListenerRequest) -> Result<(), RoutingError> {
        let mut listeners = self.listeners.write().await;
        for event in &request.events {
            listeners.insert(ListenerKey {
                project_id: request.project_id,
                flow_id: request.flow_id,
                app_name: request.app_name.clone(),
                event: event.clone(),
                identifier_value: request.identifier_value.clone(),
            });
        }
        debug!(
            flow_id = %request.flow_id,
            app = %request.app_name,
            events = request.events.len(),
            "registered app listeners"
        );
        Ok(())
    }

    async fn delete_listeners(
        &self,
        project_id: ProjectId,
        flow_id: FlowId,
    ) -> Result<(), RoutingError> {
        let mut listeners = self.listeners.write().await;
        let before = listeners.len();
        listeners.retain(|key| !(key.project_id == project_id && key.flow_id == flow_id));
        debug!(flow_id = %flow_id, removed = before - listeners.len(), "removed app listeners");
        Ok(())
    }
}
