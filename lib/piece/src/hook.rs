//! Trigger hook invocation contract.
//!
//! Piece triggers implement three hooks: `ON_ENABLE` when a flow is
//! switched on, `ON_DISABLE` when it is switched off, and `RUN` for every
//! inbound event. Hooks run inside an execution sandbox that this crate
//! only talks to through [`HookInvoker`].

use crate::error::HookError;
use crate::schedule::ScheduleOptions;
use async_trait::async_trait;
use pieceflow_core::{CollectionId, ProjectId, Result};
use pieceflow_flow::FlowVersion;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Which trigger hook to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HookType {
    OnEnable,
    OnDisable,
    Run,
}

impl fmt::Display for HookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OnEnable => "ON_ENABLE",
            Self::OnDisable => "ON_DISABLE",
            Self::Run => "RUN",
        })
    }
}

/// Everything a hook needs to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookRequest {
    pub hook_type: HookType,
    pub flow_version: FlowVersion,
    /// The inbound event; only set for `RUN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_payload: Option<JsonValue>,
    /// The flow's generic webhook URL.
    pub webhook_url: String,
    pub project_id: ProjectId,
    pub collection_id: CollectionId,
}

/// An app-webhook listener requested by an `ON_ENABLE` hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookListener {
    /// App event names to route to the flow.
    pub events: Vec<String>,
    /// Value identifying the account or resource the events belong to.
    pub identifier_value: String,
}

/// What a hook returned.
///
/// Which fields are meaningful depends on the hook type and the trigger's
/// strategy; unused fields stay empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookResponse {
    /// App-webhook listeners to register (`ON_ENABLE`).
    #[serde(default)]
    pub listeners: Vec<WebhookListener>,
    /// Polling schedule (`ON_ENABLE`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_options: Option<ScheduleOptions>,
    /// Payloads to start runs with (`RUN`).
    #[serde(default)]
    pub output: Vec<JsonValue>,
}

impl HookResponse {
    /// Creates an empty response.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a `RUN` response.
    #[must_use]
    pub fn with_output(output: Vec<JsonValue>) -> Self {
        Self {
            output,
            ..Self::default()
        }
    }

    /// Creates an app-webhook `ON_ENABLE` response.
    #[must_use]
    pub fn with_listeners(listeners: Vec<WebhookListener>) -> Self {
        Self {
            listeners,
            ..Self::default()
        }
    }

    /// Creates a polling `ON_ENABLE` response.
    #[must_use]
    pub fn with_schedule(schedule_options: ScheduleOptions) -> Self {
        Self {
            schedule_options: Some(schedule_options),
            ..Self::default()
        }
    }
}

/// Runs trigger hooks.
///
/// Implementations own timeouts; callers wait for whatever they return.
#[async_trait]
pub trait HookInvoker: Send + Sync {
    /// Runs one hook.
    async fn invoke(&self, request: HookRequest) -> Result<HookResponse, HookError>;
}
