//! Execution queue for polling jobs.
//!
//! Polling triggers are driven by a recurring job keyed by the flow version
//! id. Each firing carries enough context to call the dispatcher again.

use crate::error::QueueError;
use async_trait::async_trait;
use pieceflow_core::{CollectionId, FlowVersionId, ProjectId, Result};
use pieceflow_flow::{FlowVersion, TriggerType};
use pieceflow_piece::ScheduleOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Environment a run executes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunEnvironment {
    Production,
    Testing,
}

/// Context handed to every firing of a polling job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobData {
    pub project_id: ProjectId,
    pub environment: RunEnvironment,
    pub collection_id: CollectionId,
    pub flow_version: FlowVersion,
    pub trigger_type: TriggerType,
}

/// A recurring job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollingJob {
    /// The flow version the job polls for.
    pub id: FlowVersionId,
    pub data: JobData,
    pub schedule_options: ScheduleOptions,
}

/// Accepts and removes recurring jobs.
#[async_trait]
pub trait ExecutionQueue: Send + Sync {
    /// Adds a job, replacing any job with the same id.
    async fn add(&self, job: PollingJob) -> Result<(), QueueError>;

    /// Removes a job. Removing an unknown id succeeds.
    async fn remove_repeatable_job(&self, id: FlowVersionId) -> Result<(), QueueError>;
}

/// Execution queue held in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExecutionQueue {
    jobs: Arc<RwLock<HashMap<FlowVersionId, PollingJob>>>,
}

impl InMemoryExecutionQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the job registered under `id`.
    pub async fn get(&self, id: FlowVersionId) -> Option<PollingJob> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// Returns the number of registered jobs.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Returns whether no jobs are registered.
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl ExecutionQueue for InMemoryExecutionQueue {
    async fn add(&self, job: PollingJob) -> Result<(), QueueError> {
        job.schedule_options
            .validate()
            .map_err(|e| QueueError::InvalidSchedule {
                job_id: job.id,
                reason: e.to_string(),
            })?;
        debug!(job_id = %job.id, cron = %job.schedule_options.cron_expression, "added polling job");
        self.jobs.write().await.insert(job.id, job);
        Ok(())
    }

    async fn remove_repeatable_job(&self, id: FlowVersionId) -> Result<(), QueueError> {
        if self.jobs.write().await.remove(&id).is_some() {
            debug!(job_id = %id, "removed polling job");
        }
        Ok(())
    }
}
