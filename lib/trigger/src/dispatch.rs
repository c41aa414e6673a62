//! Turning inbound events into run payloads.

use crate::error::TriggerError;
use crate::resolve::{PieceTriggers, TriggerScope};
use pieceflow_core::Result;
use pieceflow_flow::FlowVersion;
use pieceflow_piece::HookType;
use rootcause::prelude::*;
use serde_json::Value as JsonValue;
use tracing::{debug, error, instrument};

/// Resolves the payloads an inbound event starts runs with.
#[derive(Clone)]
pub struct TriggerDispatcher {
    triggers: PieceTriggers,
}

impl TriggerDispatcher {
    #[must_use]
    pub fn new(triggers: PieceTriggers) -> Self {
        Self { triggers }
    }

    /// Returns one payload per run the event should start.
    ///
    /// Non-piece triggers pass the payload through unchanged. Piece triggers
    /// hand it to their `RUN` hook, which may return any number of payloads.
    /// A failing hook is logged and yields no payloads, so one broken
    /// integration cannot fail event ingestion.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::PieceNotFound`] or
    /// [`TriggerError::TriggerNotFound`] if the flow references a piece
    /// trigger that does not exist.
    #[instrument(skip(self, payload, flow_version), fields(flow_version_id = %flow_version.id))]
    pub async fn dispatch(
        &self,
        scope: TriggerScope,
        payload: JsonValue,
        flow_version: &FlowVersion,
    ) -> Result<Vec<JsonValue>, TriggerError> {
        let Some(settings) = flow_version.trigger.piece_settings() else {
            return Ok(vec![payload]);
        };
        let definition = self.triggers.resolve(settings).await?;

        match self
            .triggers
            .invoke(HookType::Run, scope, flow_version, Some(payload))
            .await
        {
            Ok(response) => {
                debug!(payloads = response.output.len(), "trigger produced payloads");
                Ok(response.output)
            }
            Err(cause) => {
                let report = cause.context(TriggerError::RunFailed {
                    piece_name: settings.piece_name.clone(),
                    piece_version: settings.piece_version.clone(),
                    trigger_name: definition.name,
                });
                error!(
                    flow_id = %flow_version.flow_id,
                    trigger = %flow_version.trigger.name,
                    error = %report,
                    "trigger run failed, returning no payloads"
                );
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::test_support::*;
    use pieceflow_core::FlowId;
    use pieceflow_flow::Trigger;
    use pieceflow_piece::HookResponse;
    use serde_json::json;

    #[tokio::test]
    async fn non_piece_trigger_returns_payload_unchanged() {
        let hooks = ScriptedHooks::failing();
        let dispatcher = TriggerDispatcher::new(triggers(hooks.clone()));
        let payload = json!({ "body": { "id": 7 }, "headers": {} });

        for trigger in [Trigger::empty(), Trigger::webhook("Catch")] {
            let mut version = FlowVersion::new(FlowId::new(), "Plain");
            version.trigger = trigger;
            let payloads = dispatcher
                .dispatch(scope(), payload.clone(), &version)
                .await
                .expect("dispatch");
            assert_eq!(payloads, vec![payload.clone()]);
        }
        assert!(hooks.hook_types().is_empty());
    }

    #[tokio::test]
    async fn piece_trigger_fans_out() {
        let hooks = ScriptedHooks::answering(HookResponse::with_output(vec![
            json!({ "row": 1 }),
            json!({ "row": 2 }),
            json!({ "row": 3 }),
        ]));
        let dispatcher = TriggerDispatcher::new(triggers(hooks.clone()));
        let version = piece_version(PIECE, WEBHOOK_TRIGGER);
        let payload = json!({ "batch": [1, 2, 3] });

        let payloads = dispatcher
            .dispatch(scope(), payload.clone(), &version)
            .await
            .expect("dispatch");
        assert_eq!(payloads.len(), 3);

        let calls = hooks.calls.lock().expect("lock");
        assert_eq!(calls[0].hook_type, HookType::Run);
        assert_eq!(calls[0].trigger_payload, Some(payload));
    }

    #[tokio::test]
    async fn piece_trigger_may_produce_nothing() {
        let dispatcher =
            TriggerDispatcher::new(triggers(ScriptedHooks::answering(HookResponse::empty())));
        let payloads = dispatcher
            .dispatch(scope(), json!({}), &piece_version(PIECE, POLLING_TRIGGER))
            .await
            .expect("dispatch");
        assert!(payloads.is_empty());
    }

    #[tokio::test]
    async fn failing_run_hook_is_isolated() {
        let hooks = ScriptedHooks::failing();
        let dispatcher = TriggerDispatcher::new(triggers(hooks.clone()));
        let version = piece_version(PIECE, WEBHOOK_TRIGGER);

        for _ in 0..3 {
            let payloads = dispatcher
                .dispatch(scope(), json!({ "id": 1 }), &version)
                .await
                .expect("failures are swallowed");
            assert!(payloads.is_empty());
        }
        assert_eq!(hooks.hook_types(), vec![HookType::Run; 3]);
    }

    #[tokio::test]
    async fn unresolvable_trigger_is_reported() {
        let hooks = ScriptedHooks::answering(HookResponse::empty());
        let dispatcher = TriggerDispatcher::new(triggers(hooks.clone()));

        let report = dispatcher
            .dispatch(scope(), json!({}), &piece_version("unknown-piece", WEBHOOK_TRIGGER))
            .await
            .expect_err("no piece");
        assert!(matches!(
            report.current_context(),
            TriggerError::PieceNotFound { .. }
        ));

        let report = dispatcher
            .dispatch(scope(), json!({}), &piece_version(PIECE, "unknown"))
            .await
            .expect_err("no trigger");
        assert!(matches!(
            report.current_context(),
            TriggerError::TriggerNotFound { .. }
        ));
        assert!(hooks.hook_types().is_empty());
    }
}
