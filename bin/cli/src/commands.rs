//! Command implementations.

use crate::config::CliConfig;
use crate::error::CliError;
use pieceflow_core::{CollectionId, FlowId, ProjectId, Result};
use pieceflow_flow::validate::{self, ValidationReport};
use pieceflow_flow::{
    BraceExpressionResolver, CreateFlowRequest, FlowService, FlowVersion, GraphBuilder,
    InMemoryFlowService, Trigger,
};
use pieceflow_trigger::{BaseUrlWebhookResolver, WebhookUrlResolver};
use rootcause::prelude::*;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path).context_with(|| CliError::ReadFailed {
        path: path.to_path_buf(),
    })?;
    serde_json::from_str(&contents).context_with(|| CliError::ParseFailed {
        path: path.to_path_buf(),
    })
}

fn default_display_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Materializes a draft trigger file and returns the resulting flow version.
///
/// The flow is built in an in-memory store, so the returned version is the
/// only record of it.
pub async fn materialize(
    config: &CliConfig,
    draft_path: &Path,
    display_name: Option<String>,
) -> Result<FlowVersion, CliError> {
    let draft: Trigger = read_json(draft_path)?;
    let project_id = config.project_id.unwrap_or_else(ProjectId::new);
    let request = CreateFlowRequest {
        display_name: display_name.unwrap_or_else(|| default_display_name(draft_path)),
        collection_id: CollectionId::new(),
    };

    let flows = Arc::new(InMemoryFlowService::default());
    let builder = GraphBuilder::new(flows.clone());
    let flow_id = builder
        .materialize(project_id, request, &draft)
        .await
        .context(CliError::Materialize)?;
    let flow = flows
        .get_one(project_id, flow_id)
        .await
        .context(CliError::Materialize)?;
    info!(flow_id = %flow_id, valid = flow.version.valid, "draft materialized");
    Ok(flow.version)
}

/// Validates a flow version file.
pub fn validate(path: &Path) -> Result<ValidationReport, CliError> {
    let version: FlowVersion = read_json(path)?;
    Ok(validate::validate_trigger(
        &version.trigger,
        &BraceExpressionResolver,
    ))
}

/// Returns the webhook URL of a flow.
pub fn webhook_url(config: &CliConfig, flow_id: &str) -> Result<String, CliError> {
    let flow_id: FlowId = flow_id.parse().context_with(|| CliError::InvalidFlowId {
        value: flow_id.to_string(),
    })?;
    Ok(BaseUrlWebhookResolver::new(config.webhook_base_url.as_str()).webhook_url(flow_id))
}

/// Renders a value as pretty JSON.
pub fn to_pretty_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).context(CliError::Output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn json_file(value: &serde_json::Value) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        write!(file, "{value}").expect("write");
        file
    }

    fn draft() -> serde_json::Value {
        json!({
            "name": "draft",
            "displayName": "Catch Webhook",
            "type": "WEBHOOK",
            "nextAction": {
                "name": "a",
                "displayName": "Parse",
                "type": "CODE",
                "settings": { "artifact": "export const code = async () => 1;", "input": { "x": 1 } },
                "nextAction": {
                    "name": "b",
                    "displayName": "Check",
                    "type": "BRANCH",
                    "settings": {
                        "conditions": [[{ "firstValue": "{{step-1.ok}}", "operator": "BOOLEAN_IS_TRUE" }]]
                    },
                    "onSuccessAction": {
                        "name": "c",
                        "displayName": "Yes",
                        "type": "CODE",
                        "settings": { "artifact": "export const code = async () => 2;" }
                    }
                }
            }
        })
    }

    #[tokio::test]
    async fn materialize_draft_file() {
        let file = json_file(&draft());
        let version = materialize(&CliConfig::default(), file.path(), Some("Orders".to_string()))
            .await
            .expect("materialize");

        assert_eq!(version.display_name, "Orders");
        let names: Vec<String> = version.steps().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["trigger", "step-1", "step-2", "step-2-success"]);
        assert_eq!(
            version.get_action("step-1").and_then(|a| a.input()).map(|i| i.len()),
            Some(0)
        );
        assert!(version.valid);
    }

    #[tokio::test]
    async fn materialize_reports_unreadable_and_malformed_files() {
        let config = CliConfig::default();
        let report = materialize(&config, Path::new("/nonexistent/draft.json"), None)
            .await
            .expect_err("missing file");
        assert!(matches!(report.current_context(), CliError::ReadFailed { .. }));

        let file = json_file(&json!({ "type": "NOT_A_TRIGGER" }));
        let report = materialize(&config, file.path(), None)
            .await
            .expect_err("bad json");
        assert!(matches!(report.current_context(), CliError::ParseFailed { .. }));
    }

    #[tokio::test]
    async fn validate_round_trips_materialized_version() {
        let draft_file = json_file(&draft());
        let version = materialize(&CliConfig::default(), draft_file.path(), None)
            .await
            .expect("materialize");
        let version_file = json_file(&serde_json::to_value(&version).expect("serialize"));

        let report = validate(version_file.path()).expect("validate");
        assert!(report.is_valid(), "unexpected issues: {:?}", report.issues);
    }

    #[test]
    fn validate_lists_every_issue() {
        let mut version = FlowVersion::new(FlowId::new(), "Broken");
        version.trigger = Trigger::webhook("Catch").then(
            pieceflow_flow::ActionNode::loop_on_items("step-1", "Each", "")
                .then(pieceflow_flow::ActionNode::code("step-1", "Dup")),
        );
        let file = json_file(&serde_json::to_value(&version).expect("serialize"));

        let report = validate(file.path()).expect("validate");
        assert!(!report.is_valid());
        let steps: Vec<&str> = report.issues.iter().map(|i| i.step.as_str()).collect();
        assert_eq!(steps, vec!["step-1", "step-1", "step-1"]);
    }

    #[test]
    fn webhook_url_accepts_prefixed_and_bare_ids() {
        let config = CliConfig {
            webhook_base_url: "https://hooks.example.com".to_string(),
            ..CliConfig::default()
        };
        let flow_id = FlowId::new();
        let expected = format!("https://hooks.example.com/v1/webhooks/{}", flow_id.as_ulid());
        assert_eq!(webhook_url(&config, &flow_id.to_string()).expect("prefixed"), expected);
        assert_eq!(
            webhook_url(&config, &flow_id.as_ulid().to_string()).expect("bare"),
            expected
        );
        let report = webhook_url(&config, "flow_nope").expect_err("invalid");
        assert!(matches!(report.current_context(), CliError::InvalidFlowId { .. }));
    }
}
