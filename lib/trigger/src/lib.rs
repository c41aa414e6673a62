//! Trigger handling for pieceflow.
//!
//! This crate provides:
//!
//! - **Dispatcher**: Converts inbound events into zero or more run payloads
//! - **Lifecycle**: Enables and disables piece triggers per strategy
//! - **Queue**: Recurring polling jobs keyed by flow version
//! - **Routing**: App-event listener registration
//! - **Webhooks**: Per-flow webhook URL resolution

pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod queue;
pub mod resolve;
pub mod routing;
pub mod strategy;
pub mod webhook;

pub use dispatch::TriggerDispatcher;
pub use error::{QueueError, RoutingError, TriggerError};
pub use lifecycle::TriggerLifecycle;
pub use queue::{ExecutionQueue, InMemoryExecutionQueue, JobData, PollingJob, RunEnvironment};
pub use resolve::{PieceTriggers, TriggerScope};
pub use routing::{EventRoutingRegistrar, InMemoryEventRouting, ListenerRequest};
pub use strategy::{
    AppWebhookStrategy, PollingStrategy, StrategyContext, StrategyHandler, WebhookStrategy,
};
pub use webhook::{BaseUrlWebhookResolver, WebhookUrlResolver};
